mod search;

use crate::domain::{
    ConnectivityMonitor, Dashboard, DashboardRow, Session, Snapshot, ThemeState, VersionMonitor,
    derive_dashboard,
};
use crate::infra::toggle_star;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeSet;
use std::time::Instant;
use thiserror::Error;
use time::OffsetDateTime;

pub use search::SearchInput;

/// Rows hidden behind the header, search box, borders and footer.
const LIST_CHROME_ROWS: usize = 9;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub base_url: String,
    pub snapshot: Option<Snapshot>,
    /// Wall-clock time the snapshot was received. The recency window is
    /// measured from here.
    pub snapshot_at: OffsetDateTime,
    pub load_error: Option<String>,
    pub search: SearchInput,
    pub starred: BTreeSet<String>,
    pub theme: ThemeState,
    pub selected_id: Option<String>,
    pub terminal_size: (u16, u16),
    pub notice: Option<String>,
    pub help_open: bool,
    pub detail_open: bool,
    pub connectivity: ConnectivityMonitor,
    pub version: VersionMonitor,
}

impl AppModel {
    pub fn new(
        base_url: String,
        theme: ThemeState,
        starred: BTreeSet<String>,
        now: Instant,
    ) -> Self {
        Self {
            base_url,
            snapshot: None,
            snapshot_at: OffsetDateTime::UNIX_EPOCH,
            load_error: None,
            search: SearchInput::new(),
            starred,
            theme,
            selected_id: None,
            terminal_size: (0, 0),
            notice: None,
            help_open: false,
            detail_open: false,
            connectivity: ConnectivityMonitor::new(now),
            version: VersionMonitor::new(now),
        }
    }

    pub fn dashboard(&self) -> Dashboard<'_> {
        match &self.snapshot {
            Some(snapshot) => derive_dashboard(
                snapshot,
                self.search.text(),
                &self.starred,
                self.snapshot_at,
            ),
            None => Dashboard::default(),
        }
    }

    pub fn rows(&self) -> Vec<DashboardRow<'_>> {
        self.dashboard().rows(&self.starred)
    }

    pub fn selected_index(&self, rows: &[DashboardRow<'_>]) -> Option<usize> {
        let id = self.selected_id.as_deref()?;
        rows.iter().position(|row| row.session.id == id)
    }

    pub fn selected_session(&self) -> Option<&Session> {
        let id = self.selected_id.as_deref()?;
        self.snapshot
            .as_ref()?
            .sessions
            .iter()
            .find(|session| session.id == id)
    }

    pub fn with_snapshot(mut self, snapshot: Snapshot, received_at: OffsetDateTime) -> Self {
        self.snapshot = Some(snapshot);
        self.snapshot_at = received_at;
        self.load_error = None;
        self.reconcile_selection();
        self
    }

    /// The previous snapshot stays on screen; only the error line changes.
    pub fn with_load_error(mut self, message: String) -> Self {
        self.load_error = Some(message);
        self
    }

    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_size = (width, height);
        self
    }

    pub fn with_notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }

    /// Full client reset after the server came back from an update.
    pub fn reloaded(mut self, now: Instant) -> Self {
        self.snapshot = None;
        self.load_error = None;
        self.selected_id = None;
        self.detail_open = false;
        self.connectivity.reset(now);
        self.version.schedule_check_now(now);
        self.notice = Some("Server updated. Reloaded.".to_string());
        self
    }

    pub fn update_hint(&self) -> Option<String> {
        if self.version.is_updating() {
            return Some("Updating… waiting for server".to_string());
        }
        if !self.version.can_update() {
            return None;
        }
        let info = self.version.info();
        let latest = info.latest.as_deref().unwrap_or("?");
        Some(format!(
            "Update available: v{} -> v{latest}. Ctrl+U to update.",
            info.current
        ))
    }

    fn page_size(&self) -> usize {
        (self.terminal_size.1 as usize)
            .saturating_sub(LIST_CHROME_ROWS)
            .max(1)
    }

    /// Keeps the selected id when it is still visible, otherwise falls back to
    /// the first row.
    fn reconcile_selection(&mut self) {
        let next = {
            let rows = self.rows();
            match self.selected_index(&rows) {
                Some(index) => Some(rows[index].session.id.clone()),
                None => rows.first().map(|row| row.session.id.clone()),
            }
        };
        if next.is_none() {
            self.detail_open = false;
        }
        self.selected_id = next;
    }

    fn move_selection(&mut self, target: SelectionMove) {
        let next = {
            let rows = self.rows();
            if rows.is_empty() {
                None
            } else {
                let last = rows.len() - 1;
                let current = self.selected_index(&rows).unwrap_or(0);
                let index = match target {
                    SelectionMove::By(delta) if delta < 0 => {
                        current.saturating_sub(delta.unsigned_abs())
                    }
                    SelectionMove::By(delta) => current.saturating_add(delta as usize).min(last),
                    SelectionMove::First => 0,
                    SelectionMove::Last => last,
                };
                Some(rows[index].session.id.clone())
            }
        };
        self.selected_id = next;
    }
}

#[derive(Clone, Copy, Debug)]
enum SelectionMove {
    By(isize),
    First,
    Last,
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Paste(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    Refresh,
    SaveStars { starred: BTreeSet<String> },
    SaveTheme(ThemeState),
    TriggerUpdate,
    ProbeNow { probe: u64 },
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Paste(text) => update_on_paste(model, text),
    }
}

fn update_on_key(model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let mut model = model;
    model.notice = None;

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        return (model, AppCommand::Quit);
    }

    if model.connectivity.overlay().is_some() {
        return update_disconnected(model, key);
    }
    if model.help_open {
        return update_help(model, key);
    }
    if model.detail_open {
        return update_detail(model, key);
    }

    if ctrl {
        return update_command_key(model, key);
    }

    match key.code {
        KeyCode::F(1) => model.help_open = true,
        KeyCode::Char('?') if model.search.is_empty() => model.help_open = true,
        KeyCode::Enter => model.detail_open = model.selected_id.is_some(),
        KeyCode::Up => model.move_selection(SelectionMove::By(-1)),
        KeyCode::Down => model.move_selection(SelectionMove::By(1)),
        KeyCode::PageUp => {
            let page = model.page_size() as isize;
            model.move_selection(SelectionMove::By(-page));
        }
        KeyCode::PageDown => {
            let page = model.page_size() as isize;
            model.move_selection(SelectionMove::By(page));
        }
        KeyCode::Home => model.move_selection(SelectionMove::First),
        KeyCode::End => model.move_selection(SelectionMove::Last),
        KeyCode::Left => model.search.move_left(),
        KeyCode::Right => model.search.move_right(),
        KeyCode::Esc => {
            if !model.search.is_empty() {
                model.search.clear();
                model.reconcile_selection();
            }
        }
        KeyCode::Backspace => {
            if model.search.backspace() {
                model.reconcile_selection();
            }
        }
        KeyCode::Delete => {
            if model.search.delete_forward() {
                model.reconcile_selection();
            }
        }
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META) =>
        {
            model.search.insert_char(ch);
            model.reconcile_selection();
        }
        _ => {}
    }

    (model, AppCommand::None)
}

fn update_command_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Char('r') => (model, AppCommand::Refresh),
        KeyCode::Char('s') => {
            let Some(id) = model.selected_id.clone() else {
                return (model, AppCommand::None);
            };
            let label = if toggle_star(&mut model.starred, &id) {
                "Starred"
            } else {
                "Unstarred"
            };
            model.notice = Some(label.to_string());
            let command = AppCommand::SaveStars {
                starred: model.starred.clone(),
            };
            (model, command)
        }
        KeyCode::Char('t') => {
            model.theme = model.theme.with_mode_toggled();
            let theme = model.theme;
            (model, AppCommand::SaveTheme(theme))
        }
        KeyCode::Char('p') => {
            model.theme = model.theme.with_next_palette();
            model.notice = Some(format!("Palette: {}", model.theme.palette.as_str()));
            let theme = model.theme;
            (model, AppCommand::SaveTheme(theme))
        }
        KeyCode::Char('u') => {
            if model.version.is_updating() {
                model.notice = Some("Update already in progress".to_string());
                return (model, AppCommand::None);
            }
            if !model.version.can_update() {
                model.notice = Some("No update available".to_string());
                return (model, AppCommand::None);
            }
            (model, AppCommand::TriggerUpdate)
        }
        _ => (model, AppCommand::None),
    }
}

fn update_disconnected(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Char('r') | KeyCode::Char('R') => {
            if let Some(probe) = model.connectivity.retry_now() {
                return (model, AppCommand::ProbeNow { probe });
            }
            (model, AppCommand::None)
        }
        _ => (model, AppCommand::None),
    }
}

fn update_help(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    if matches!(
        key.code,
        KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')
    ) {
        model.help_open = false;
    }
    (model, AppCommand::None)
}

fn update_detail(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
            model.detail_open = false;
        }
        KeyCode::Up => model.move_selection(SelectionMove::By(-1)),
        KeyCode::Down => model.move_selection(SelectionMove::By(1)),
        _ => {}
    }
    (model, AppCommand::None)
}

fn update_on_paste(model: AppModel, text: String) -> (AppModel, AppCommand) {
    let mut model = model;
    model.notice = None;

    if model.connectivity.overlay().is_some() || model.help_open || model.detail_open {
        return (model, AppCommand::None);
    }

    model.search.insert_str(&text);
    model.reconcile_selection();
    (model, AppCommand::None)
}
