mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppEvent, AppModel};
use crate::cli::CliInvocation;
use crate::domain::{
    ConnectivityChange, ProbeOutcome, Session, Snapshot, VersionAction,
    count_unparsed_timestamps,
};
use crate::infra::{
    ApiClient, ApiError, ApiRequest, ApiResponse, ApiWorker, DashboardConfig, PreferenceStore,
    load_stars, resolve_config, save_stars,
};
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::size as terminal_size;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CCDASH_LOG";
const LOG_FILE_NAME: &str = "ccdash.log";

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),

    #[error(transparent)]
    Config(#[from] crate::infra::ConfigError),
}

enum LogTarget<'a> {
    StateDir(Option<&'a Path>),
    Stderr,
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        let code = match error {
            MainError::Config(_) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Tui { overrides } => {
            let config = resolve_config(&overrides)?;
            init_logging(LogTarget::StateDir(config.state_dir.as_deref()));
            info!(url = %config.base_url, poll = ?config.poll_interval, "starting dashboard");
            Ok(run_tui(config)?)
        }
        CliInvocation::Command { command, overrides } => {
            let config = resolve_config(&overrides)?;
            init_logging(LogTarget::Stderr);
            crate::cli::run(command, &config)?;
            Ok(())
        }
    }
}

fn init_logging(target: LogTarget<'_>) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init();
        }
        LogTarget::StateDir(dir) => match dir.and_then(|dir| open_log_file(dir).ok()) {
            Some(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
            }
            None => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(io::sink)
                    .try_init();
            }
        },
    }
}

fn open_log_file(dir: &Path) -> io::Result<fs::File> {
    fs::create_dir_all(dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
}

fn print_help() {
    let text = format!(
        "{name} - terminal dashboard for coding-agent sessions\n\nUSAGE:\n  {name} [--url URL] [--interval SECS]          Start the TUI\n  {name} sessions [--query Q] [--json]          Print active and previous sessions once\n  {name} version                                Print backend version info\n  {name} health                                 Probe the backend (exit 1 if down)\n  {name} star ID | {name} unstar ID             Edit starred sessions\n  {name} theme [dark|light] [--palette NAME]    Show or set the theme\n  {name} --help | --version\n\nGLOBAL FLAGS:\n  --url URL        Backend base URL (default: http://127.0.0.1:5173)\n  --interval SECS  Session poll interval in seconds (default: 3)\n\nPALETTES:\n  ember ocean forest rose violet amber slate nord mono\n\nOUTPUT:\n  sessions: section<TAB>group<TAB>state<TAB>id<TAB>summary  (starred ids are prefixed with *)\n\nENV:\n  CCDASH_URL        Backend base URL (overridden by --url)\n  CCDASH_POLL_SECS  Poll interval (overridden by --interval)\n  CCDASH_STATE_DIR  State directory (default: ~/.ccdash)\n  CCDASH_LOG        Log filter, e.g. debug (default: info)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn run_tui(config: DashboardConfig) -> Result<(), crate::app::AppError> {
    let mut notices: Vec<String> = Vec::new();

    let preferences = match &config.state_dir {
        Some(dir) => {
            let (store, error) = PreferenceStore::load_or_reset(dir);
            if let Some(error) = error {
                warn!(%error, "theme preferences unreadable; using defaults");
            }
            store
        }
        None => {
            notices.push("Preferences disabled: no state directory".to_string());
            PreferenceStore::in_memory()
        }
    };

    let starred = match &config.state_dir {
        Some(dir) => match load_stars(dir) {
            Ok(starred) => starred,
            Err(error) => {
                warn!(%error, "starred sessions unreadable");
                notices.push(format!("Starred sessions reset: {error}"));
                BTreeSet::new()
            }
        },
        None => BTreeSet::new(),
    };

    let notice = (!notices.is_empty()).then(|| notices.join("  ·  "));
    let mut model = AppModel::new(
        config.base_url.clone(),
        preferences.theme(),
        starred,
        Instant::now(),
    )
    .with_notice(notice);

    let mut terminal = setup_terminal()?;
    if let Ok((width, height)) = terminal_size() {
        model = model.with_terminal_size(width, height);
    }
    let result = run(&mut terminal, &mut model, &config, preferences);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let _ = stdout.execute(EnableBracketedPaste);
    let keyboard_flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    let _ = stdout.execute(PushKeyboardEnhancementFlags(keyboard_flags));
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), app::AppError> {
    disable_raw_mode()?;
    let _ = execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        PopKeyboardEnhancementFlags
    );
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Background workers, one per concern, so a slow snapshot fetch never
/// delays a liveness probe.
struct Workers {
    data: ApiWorker,
    probe: ApiWorker,
    version: ApiWorker,
}

impl Workers {
    fn spawn(client: ApiClient) -> io::Result<Self> {
        Ok(Self {
            data: ApiWorker::spawn("data", client.clone())?,
            probe: ApiWorker::spawn("probe", client.clone())?,
            version: ApiWorker::spawn("version", client)?,
        })
    }
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    config: &DashboardConfig,
    mut preferences: PreferenceStore,
) -> Result<(), app::AppError> {
    let workers = Workers::spawn(ApiClient::new(config.base_url.clone()))?;
    let mut fetch_in_flight = false;
    let mut next_fetch_at = Instant::now();

    loop {
        while let Some(response) = workers.data.try_recv() {
            if let ApiResponse::Snapshot(result) = response {
                fetch_in_flight = false;
                next_fetch_at = Instant::now() + config.poll_interval;
                apply_snapshot(model, result);
            }
        }

        while let Some(response) = workers.probe.try_recv() {
            if let ApiResponse::Probe { probe, result } = response {
                if let Err(error) = &result {
                    debug!(probe, %error, "liveness probe failed");
                }
                let outcome = match result {
                    Ok(()) => ProbeOutcome::Alive,
                    Err(_) => ProbeOutcome::Failed,
                };
                match model
                    .connectivity
                    .on_probe_result(probe, outcome, Instant::now())
                {
                    Some(ConnectivityChange::Lost) => {
                        warn!(
                            url = %config.base_url,
                            state = ?model.connectivity.state(),
                            "connection lost"
                        );
                    }
                    Some(ConnectivityChange::Restored) => {
                        info!(
                            failures = model.connectivity.consecutive_failures(),
                            "connection restored"
                        );
                        next_fetch_at = Instant::now();
                    }
                    None => {}
                }
            }
        }

        while let Some(response) = workers.version.try_recv() {
            let now = Instant::now();
            match response {
                ApiResponse::Version(Ok(info)) => {
                    debug!(
                        current = %info.current,
                        latest = ?info.latest,
                        update_available = info.update_available,
                        "version checked"
                    );
                    model.version.on_version_result(Some(info), now);
                }
                ApiResponse::Version(Err(error)) => {
                    debug!(%error, "version check failed");
                    model.version.on_version_result(None, now);
                }
                ApiResponse::UpdateTriggered(Ok(())) => {
                    info!("update triggered; waiting for server");
                }
                ApiResponse::UpdateTriggered(Err(error)) => {
                    // The server may drop the request while it restarts.
                    warn!(%error, "update request errored; still waiting for the server");
                }
                ApiResponse::Ready { wait, result } => {
                    let action = model.version.on_ready_result(wait, result.is_ok(), now);
                    if action == Some(VersionAction::Reload) {
                        info!("server is back after update; reloading");
                        *model = model.clone().reloaded(now);
                        next_fetch_at = now;
                    }
                }
                ApiResponse::Snapshot(_) | ApiResponse::Probe { .. } => {}
            }
        }

        let now = Instant::now();
        if let Some(probe) = model.connectivity.poll(now) {
            workers.probe.submit(ApiRequest::Probe(probe));
        }
        while let Some(action) = model.version.poll(now) {
            match action {
                VersionAction::FetchVersion => {
                    workers.version.submit(ApiRequest::FetchVersion);
                }
                VersionAction::ProbeReady { wait } => {
                    workers.version.submit(ApiRequest::ProbeReady(wait));
                }
                VersionAction::UpdateAbandoned => {
                    warn!("update abandoned: server did not come back in time");
                    *model = model.clone().with_notice(Some(
                        "Update did not finish in time. Still on the old version.".to_string(),
                    ));
                }
                VersionAction::TriggerUpdate | VersionAction::Reload => {}
            }
        }
        if !fetch_in_flight && now >= next_fetch_at {
            fetch_in_flight = workers.data.submit(ApiRequest::FetchSnapshot);
        }

        terminal.draw(|frame| ui::render(frame, model))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let command = match event::read()? {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                let (next, command) = app::update(model.clone(), AppEvent::Key(key));
                *model = next;
                command
            }
            Event::Paste(text) => {
                let (next, command) = app::update(model.clone(), AppEvent::Paste(text));
                *model = next;
                command
            }
            Event::Resize(width, height) => {
                *model = model.clone().with_terminal_size(width, height);
                AppCommand::None
            }
            _ => AppCommand::None,
        };

        match command {
            AppCommand::None => {}
            AppCommand::Quit => break,
            AppCommand::Refresh => {
                next_fetch_at = Instant::now();
                model.version.schedule_check_now(Instant::now());
            }
            AppCommand::SaveStars { starred } => {
                if let Some(dir) = &config.state_dir {
                    if let Err(error) = save_stars(dir, &starred) {
                        warn!(%error, "failed to save starred sessions");
                        *model = model
                            .clone()
                            .with_notice(Some(format!("Failed to save stars: {error}")));
                    }
                }
            }
            AppCommand::SaveTheme(theme) => {
                if let Err(error) = preferences.set_theme(theme) {
                    warn!(%error, "failed to save theme");
                    *model = model
                        .clone()
                        .with_notice(Some(format!("Failed to save theme: {error}")));
                }
            }
            AppCommand::TriggerUpdate => {
                if model.version.begin_update(Instant::now()) == Some(VersionAction::TriggerUpdate)
                {
                    info!(
                        current = %model.version.info().current,
                        latest = ?model.version.info().latest,
                        "triggering update"
                    );
                    if !workers.version.submit(ApiRequest::TriggerUpdate) {
                        warn!("update worker is gone; update not sent");
                        model.version.abort_update();
                        *model = model
                            .clone()
                            .with_notice(Some("Update could not be sent.".to_string()));
                    }
                }
            }
            AppCommand::ProbeNow { probe } => {
                workers.probe.submit(ApiRequest::Probe(probe));
            }
        }
    }

    Ok(())
}

fn apply_snapshot(model: &mut AppModel, result: Result<Snapshot, ApiError>) {
    match result {
        Ok(snapshot) => {
            let unparsed = {
                let all: Vec<&Session> = snapshot.sessions.iter().collect();
                count_unparsed_timestamps(&all, &snapshot.processes)
            };
            if unparsed > 0 {
                debug!(
                    count = unparsed,
                    "sessions with unparseable updated_at left out of previous"
                );
            }
            *model = model
                .clone()
                .with_snapshot(snapshot, OffsetDateTime::now_utc());
        }
        Err(error) => {
            debug!(%error, "snapshot fetch failed");
            *model = model.clone().with_load_error(error.to_string());
        }
    }
}
