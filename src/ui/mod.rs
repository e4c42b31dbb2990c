mod theme;

use crate::app::AppModel;
use crate::domain::{
    DashboardRow, DisconnectOverlay, ProcessInfo, Section, Session, live_state,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use theme::Palette;
use time::OffsetDateTime;
use unicode_width::UnicodeWidthStr;

pub fn render(frame: &mut Frame, model: &AppModel) {
    let full_area = frame.area();
    if full_area.width == 0 || full_area.height == 0 {
        return;
    }

    let palette = Palette::resolve(model.theme);
    frame.render_widget(Block::default().style(palette.base()), full_area);

    render_header(frame, full_area, model, &palette);

    let content_area = if full_area.height > 1 {
        Rect {
            x: full_area.x,
            y: full_area.y.saturating_add(1),
            width: full_area.width,
            height: full_area.height.saturating_sub(1),
        }
    } else {
        full_area
    };

    render_dashboard(frame, content_area, model, &palette);

    if model.detail_open {
        if let Some(session) = model.selected_session() {
            render_detail_overlay(frame, content_area, model, session, &palette);
        }
    }

    if model.help_open {
        render_help_overlay(frame, content_area, &palette);
    }

    if let Some(overlay) = model.connectivity.overlay() {
        render_disconnect_overlay(frame, content_area, model, overlay, &palette);
    }
}

fn render_header(frame: &mut Frame, area: Rect, model: &AppModel, palette: &Palette) {
    let bar_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 1,
    };

    let base_style = Style::default().fg(palette.fg).bg(palette.bar_bg);
    let dim_style = Style::default().fg(palette.muted).bg(palette.bar_bg);
    let (dot_color, status) = if model.connectivity.is_disconnected() {
        (palette.error, "disconnected")
    } else {
        (palette.success, "connected")
    };

    let dashboard = model.dashboard();
    let title = " ccdash ";
    let counts = format!(
        "active {} · previous {}",
        dashboard.active_count(),
        dashboard.previous_count()
    );
    let theme = format!(
        "{}/{} ",
        model.theme.mode.as_str(),
        model.theme.palette.as_str()
    );

    let fixed = UnicodeWidthStr::width(title)
        + UnicodeWidthStr::width(" ● ")
        + status.len()
        + 2 * UnicodeWidthStr::width("  ·  ")
        + UnicodeWidthStr::width(counts.as_str())
        + UnicodeWidthStr::width(theme.as_str());
    let url_width = (bar_area.width as usize).saturating_sub(fixed + 2);
    let url = truncate_end(&model.base_url, url_width);
    let used = fixed + UnicodeWidthStr::width(url.as_str()) + 2;
    let remaining = (bar_area.width as usize).saturating_sub(used);

    let spans = vec![
        Span::styled(
            title,
            Style::default()
                .fg(palette.accent)
                .bg(palette.bar_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ", base_style),
        Span::styled(url, dim_style),
        Span::styled(" ● ", Style::default().fg(dot_color).bg(palette.bar_bg)),
        Span::styled(status, dim_style),
        Span::styled("  ·  ", dim_style),
        Span::styled(counts, base_style),
        Span::styled("  ·  ", dim_style),
        Span::styled(" ".repeat(remaining), base_style),
        Span::styled(theme, dim_style),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base_style), bar_area);
}

fn render_dashboard(frame: &mut Frame, area: Rect, model: &AppModel, palette: &Palette) {
    let area = inner_area(area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_search(frame, chunks[0], model, palette);
    render_sessions(frame, chunks[1], model, palette);

    let footer = footer_paragraph(
        "Keys: arrows=move  Enter=details  Ctrl+S=star  Ctrl+T=mode  Ctrl+P=palette  Ctrl+R=refresh  Esc=clear  Ctrl+Q=quit  F1=help",
        model.notice.as_deref(),
        model.update_hint().as_deref(),
        palette,
    );
    frame.render_widget(footer, chunks[2]);
}

fn render_search(frame: &mut Frame, area: Rect, model: &AppModel, palette: &Palette) {
    let search_text = if model.search.is_empty() {
        Text::from(Line::from(Span::styled(
            "Type to filter sessions…",
            Style::default().fg(palette.dim),
        )))
    } else {
        Text::from(model.search.text())
    };
    let search = Paragraph::new(search_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .padding(Padding::horizontal(1))
            .title("Search"),
    );
    frame.render_widget(search, area);

    let overlay_open =
        model.help_open || model.detail_open || model.connectivity.overlay().is_some();
    if overlay_open || area.width < 4 || area.height < 3 {
        return;
    }
    let before: String = model.search.text().chars().take(model.search.cursor()).collect();
    let offset = UnicodeWidthStr::width(before.as_str()) as u16;
    let x = area
        .x
        .saturating_add(2)
        .saturating_add(offset)
        .min(area.x + area.width.saturating_sub(2));
    let y = area.y.saturating_add(1);
    frame.set_cursor_position(Position { x, y });
}

fn render_sessions(frame: &mut Frame, area: Rect, model: &AppModel, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .padding(Padding::horizontal(1))
        .title("Sessions");

    let Some(snapshot) = &model.snapshot else {
        let message = match &model.load_error {
            Some(error) => Line::from(Span::styled(
                format!("Failed to load sessions: {error}"),
                Style::default().fg(palette.error),
            )),
            None => Line::from("Loading sessions…"),
        };
        frame.render_widget(Paragraph::new(message).block(block), area);
        return;
    };

    let dashboard = model.dashboard();
    if dashboard.is_empty() {
        let message = if model.search.is_empty() {
            "No active or recent sessions."
        } else {
            "No matching sessions. Press Esc to clear the filter."
        };
        frame.render_widget(Paragraph::new(message).block(block), area);
        return;
    }

    let rows = dashboard.rows(&model.starred);
    let max_width = (area.width as usize).saturating_sub(6);
    let mut items: Vec<ListItem> = Vec::new();
    let mut selected_item = None;
    let selected_row = model.selected_index(&rows);
    let mut row_index = 0usize;
    let mut last_section = None;

    for (section, group) in dashboard.ordered() {
        if last_section != Some(section) {
            let count = match section {
                Section::Active => dashboard.active_count(),
                Section::Previous => dashboard.previous_count(),
            };
            if last_section.is_some() {
                items.push(ListItem::new(Line::from("")));
            }
            items.push(ListItem::new(Line::from(Span::styled(
                format!("{} ({count})", section.label()),
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ))));
            last_section = Some(section);
        }

        items.push(ListItem::new(Line::from(Span::styled(
            format!("  {} ({})", group.key, group.sessions.len()),
            Style::default().fg(palette.muted),
        ))));

        for _ in &group.sessions {
            let Some(row) = rows.get(row_index) else {
                break;
            };
            if selected_row == Some(row_index) {
                selected_item = Some(items.len());
            }
            let process = snapshot.processes.get(&row.session.id);
            items.push(match row.section {
                Section::Active => active_list_item(row, process, max_width, palette),
                Section::Previous => {
                    previous_list_item(row, model.snapshot_at, max_width, palette)
                }
            });
            row_index += 1;
        }
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(palette.highlight())
        .highlight_symbol("▸ ");

    let mut state = ListState::default();
    state.select(selected_item);
    frame.render_stateful_widget(list, area, &mut state);
}

fn active_list_item(
    row: &DashboardRow<'_>,
    process: Option<&ProcessInfo>,
    max_width: usize,
    palette: &Palette,
) -> ListItem<'static> {
    let session = row.session;
    let star = if row.starred { "★ " } else { "  " };
    let label = if row.class.label.is_empty() {
        String::new()
    } else {
        format!("{} ", row.class.label)
    };

    let mut detail_parts = Vec::new();
    if let Some(place) = repo_and_branch(session) {
        detail_parts.push(place);
    }
    detail_parts.push(format!(
        "{} turns · {} files · {} tools",
        session.counters.turns, session.counters.files, session.counters.tool_calls
    ));
    let background = process
        .map(|process| process.background_tasks)
        .unwrap_or(session.counters.background_tasks);
    if background > 0 {
        detail_parts.push(format!("{background} bg"));
    }
    if process.is_some_and(|process| process.yolo) {
        detail_parts.push("yolo".to_string());
    }
    let detail = format!("  ·  {}", detail_parts.join(" · "));

    let used = 2 + UnicodeWidthStr::width(star) + UnicodeWidthStr::width(label.as_str());
    let title_width = max_width
        .saturating_sub(used + UnicodeWidthStr::width(detail.as_str()))
        .max(8);
    let title = truncate_end(session.title(), title_width);
    let detail_width = max_width.saturating_sub(used + UnicodeWidthStr::width(title.as_str()));

    ListItem::new(Line::from(vec![
        Span::styled("▌ ", palette.tile(row.class.tile)),
        Span::styled(star, Style::default().fg(palette.accent)),
        Span::styled(label, palette.badge(row.class.badge)),
        Span::raw(title),
        Span::styled(
            truncate_end(&detail, detail_width),
            Style::default().fg(palette.dim),
        ),
    ]))
    .style(palette.row(row.class.row))
}

fn previous_list_item(
    row: &DashboardRow<'_>,
    now: OffsetDateTime,
    max_width: usize,
    palette: &Palette,
) -> ListItem<'static> {
    let session = row.session;
    let star = if row.starred { "★ " } else { "  " };
    let when = session
        .updated_ago
        .clone()
        .unwrap_or_else(|| relative_time_ago(session.updated_at_parsed, now));
    let place = repo_and_branch(session).unwrap_or_default();

    let right = if place.is_empty() {
        when
    } else {
        format!("{place}  ·  {when}")
    };
    let right_width = UnicodeWidthStr::width(right.as_str());
    let content_width = max_width.saturating_sub(UnicodeWidthStr::width(star) + 2);

    let min_left = 8usize;
    let gap = 2usize;
    if right_width + gap + min_left >= content_width {
        return ListItem::new(Line::from(vec![
            Span::raw("  "),
            Span::styled(star, Style::default().fg(palette.accent)),
            Span::raw(truncate_end(session.title(), content_width)),
        ]))
        .style(palette.row(row.class.row));
    }

    let title = truncate_end(session.title(), content_width - right_width - gap);
    let padding = content_width.saturating_sub(UnicodeWidthStr::width(title.as_str()) + right_width);

    ListItem::new(Line::from(vec![
        Span::raw("  "),
        Span::styled(star, Style::default().fg(palette.accent)),
        Span::raw(title),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, Style::default().fg(palette.dim)),
    ]))
    .style(palette.row(row.class.row))
}

fn repo_and_branch(session: &Session) -> Option<String> {
    match (session.repository.as_deref(), session.branch.as_deref()) {
        (Some(repo), Some(branch)) => Some(format!("{repo}@{branch}")),
        (Some(repo), None) => Some(repo.to_string()),
        (None, Some(branch)) => Some(format!("@{branch}")),
        (None, None) => None,
    }
}

fn footer_paragraph(
    base: &str,
    notice: Option<&str>,
    update_hint: Option<&str>,
    palette: &Palette,
) -> Paragraph<'static> {
    let mut spans: Vec<Span<'static>> = vec![Span::raw(base.to_string())];
    if let Some(message) = notice.filter(|message| !message.trim().is_empty()) {
        spans.push(Span::raw("  ·  "));
        spans.push(Span::styled(
            message.to_string(),
            Style::default().fg(palette.fg),
        ));
    }
    if let Some(hint) = update_hint {
        spans.push(Span::raw("  ·  "));
        spans.push(Span::styled(
            hint.to_string(),
            Style::default()
                .fg(palette.success)
                .add_modifier(Modifier::BOLD),
        ));
    }

    Paragraph::new(Line::from(spans)).style(Style::default().fg(palette.dim))
}

fn render_detail_overlay(
    frame: &mut Frame,
    area: Rect,
    model: &AppModel,
    session: &Session,
    palette: &Palette,
) {
    let popup = centered_rect(80, 80, area);
    frame.render_widget(Clear, popup);

    let process = model
        .snapshot
        .as_ref()
        .and_then(|snapshot| snapshot.processes.get(&session.id));
    let label_style = Style::default().fg(palette.muted);
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<14}"), label_style),
            Span::raw(value),
        ])
    };
    let or_dash = |value: Option<&str>| value.unwrap_or("—").to_string();
    let stamp = |raw: Option<&str>, ago: Option<&str>| match (raw, ago) {
        (Some(raw), Some(ago)) => format!("{raw} ({ago})"),
        (Some(raw), None) => raw.to_string(),
        (None, _) => "—".to_string(),
    };

    let counters = session.counters;
    let state = model
        .snapshot
        .as_ref()
        .and_then(|snapshot| live_state(session, &snapshot.processes))
        .map(|state| state.as_str())
        .unwrap_or("—");

    let mut text = vec![
        Line::from(Span::styled(
            session.title().to_string(),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("Session", session.id.clone()),
        field("State", state.to_string()),
        field("Group", session.group.clone()),
        field("Repository", or_dash(session.repository.as_deref())),
        field("Branch", or_dash(session.branch.as_deref())),
        field("Directory", or_dash(session.cwd.as_deref())),
        field(
            "Created",
            stamp(session.created_at.as_deref(), session.created_ago.as_deref()),
        ),
        field(
            "Updated",
            stamp(session.updated_at.as_deref(), session.updated_ago.as_deref()),
        ),
        field(
            "Activity",
            format!(
                "{} turns · {} files · {} checkpoints · {} tool calls · {} subagents · {} background",
                counters.turns,
                counters.files,
                counters.checkpoints,
                counters.tool_calls,
                counters.subagent_runs,
                counters.background_tasks
            ),
        ),
    ];

    if !session.intent.is_empty() {
        text.push(field("Intent", session.intent.clone()));
    }

    let mut servers = session.mcp_servers.clone();
    if let Some(process) = process {
        for server in &process.mcp_servers {
            if !servers.contains(server) {
                servers.push(server.clone());
            }
        }
    }
    if !servers.is_empty() {
        text.push(field("MCP servers", servers.join(", ")));
    }
    if !session.restart_command.is_empty() {
        text.push(field("Restart", session.restart_command.clone()));
    }

    text.push(Line::from(""));
    match process {
        Some(process) => {
            let pid = |value: Option<u32>| value.map(|pid| pid.to_string()).unwrap_or("—".into());
            text.push(field(
                "Process",
                format!(
                    "pid {} · parent {} · terminal {}",
                    pid(process.pid),
                    pid(process.parent_pid),
                    pid(process.terminal_pid)
                ),
            ));
            if !process.command.is_empty() {
                text.push(field("Command", process.command.clone()));
            }
            if process.yolo {
                text.push(field("Mode", "yolo (auto-approve)".to_string()));
            }
        }
        None => text.push(field("Process", "not running".to_string())),
    }

    let paragraph = Paragraph::new(text)
        .style(palette.overlay())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .padding(Padding::horizontal(1))
                .title("Session (Esc to close)"),
        );
    frame.render_widget(paragraph, popup);
}

fn render_help_overlay(frame: &mut Frame, area: Rect, palette: &Palette) {
    let popup = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);

    let text = vec![
        Line::from("Navigation"),
        Line::from("  - Arrows: move selection"),
        Line::from("  - PgUp/PgDn, Home/End: jump"),
        Line::from("  - Enter: session details"),
        Line::from("  - Type to filter, Esc clears the filter"),
        Line::from(""),
        Line::from("Sessions"),
        Line::from("  - Ctrl+S: star or unstar (starred sort first in their group)"),
        Line::from("  - Active: sessions with a running process"),
        Line::from("  - Previous: updated within the last 5 days"),
        Line::from(""),
        Line::from("Global"),
        Line::from("  - Ctrl+R: refresh now"),
        Line::from("  - Ctrl+T: toggle dark/light"),
        Line::from("  - Ctrl+P: next palette"),
        Line::from("  - Ctrl+U: install available update"),
        Line::from("  - r: retry now while disconnected"),
        Line::from("  - Ctrl+Q or Ctrl+C: quit"),
        Line::from(""),
        Line::from("Help"),
        Line::from("  - F1 or ?: toggle this help"),
    ];

    let paragraph = Paragraph::new(text)
        .style(palette.overlay())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .padding(Padding::horizontal(1))
                .title("Help (F1 or ? to close)"),
        );
    frame.render_widget(paragraph, popup);
}

fn render_disconnect_overlay(
    frame: &mut Frame,
    area: Rect,
    model: &AppModel,
    overlay: DisconnectOverlay,
    palette: &Palette,
) {
    let popup = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup);

    let status = if overlay.retrying {
        "Retrying now…".to_string()
    } else {
        format!("Retrying in {}s…", overlay.retry_seconds)
    };
    let failures = model.connectivity.consecutive_failures();

    let text = vec![
        Line::from(Span::styled(
            "Connection lost.",
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(status),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} · failed probes: {failures}", model.base_url),
            Style::default().fg(palette.muted),
        )),
        Line::from(Span::styled(
            "r=retry now  Ctrl+Q=quit",
            Style::default().fg(palette.dim),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .style(palette.overlay())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.error))
                .title("Disconnected"),
        );
    frame.render_widget(paragraph, popup);
}

fn truncate_end(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let ellipsis = "…";
    let available = max_width.saturating_sub(UnicodeWidthStr::width(ellipsis));
    let mut out = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width > available {
            break;
        }
        width += ch_width;
        out.push(ch);
    }
    out.push_str(ellipsis);
    out
}

fn relative_time_ago(moment: Option<OffsetDateTime>, now: OffsetDateTime) -> String {
    let Some(moment) = moment else {
        return "unknown".to_string();
    };
    let seconds = (now - moment).whole_seconds().max(0) as u64;
    if seconds < 60 {
        return "just now".to_string();
    }
    humanize_seconds(seconds)
}

fn humanize_seconds(seconds: u64) -> String {
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    format!("{days}d ago")
}

fn inner_area(area: Rect) -> Rect {
    if area.width < 40 || area.height < 12 {
        return area;
    }
    area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    })
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
