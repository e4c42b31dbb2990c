use crate::domain::{
    DashboardRow, Session, ThemeMode, ThemePalette, count_unparsed_timestamps, derive_dashboard,
};
use crate::infra::{
    ApiClient, ApiError, ConfigOverrides, DashboardConfig, LoadPreferencesError, LoadStarsError,
    PROBE_TIMEOUT, PreferenceStore, ResolveStateDirError, SavePreferencesError, SaveStarsError,
    load_stars, resolve_state_dir, save_stars,
};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui {
        overrides: ConfigOverrides,
    },
    Command {
        command: CliCommand,
        overrides: ConfigOverrides,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    Sessions {
        query: Option<String>,
        json: bool,
    },
    Version,
    Health,
    Star {
        id: String,
    },
    Unstar {
        id: String,
    },
    Theme {
        mode: Option<ThemeMode>,
        palette: Option<ThemePalette>,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("missing session id\nHint: run `ccdash sessions` and copy the id column.")]
    MissingSessionId,
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1).peekable();
    let mut overrides = ConfigOverrides::default();
    while let Some(arg) = iter.peek() {
        match arg.as_str() {
            "--url" | "-u" => {
                let _ = iter.next();
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--url".to_string()))?;
                overrides.base_url = Some(value.to_string());
            }
            "--interval" | "-i" => {
                let _ = iter.next();
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--interval".to_string()))?;
                overrides.poll_secs = Some(parse_secs_flag("--interval", value)?);
            }
            "--" => {
                let _ = iter.next();
                break;
            }
            _ => break,
        }
    }

    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::Tui { overrides });
    };

    let command = match subcommand.as_str() {
        "sessions" => {
            let mut query: Option<String> = None;
            let mut json = false;

            let mut args = iter;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--query" | "-q" => {
                        let value = args.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--query".to_string())
                        })?;
                        query = Some(value.to_string());
                    }
                    "--json" => json = true,
                    "--url" | "-u" => {
                        let value = args
                            .next()
                            .ok_or_else(|| CliParseError::MissingFlagValue("--url".to_string()))?;
                        overrides.base_url = Some(value.to_string());
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                    }
                }
            }

            CliCommand::Sessions { query, json }
        }
        "version" | "health" => {
            let mut args = iter;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--url" | "-u" => {
                        let value = args
                            .next()
                            .ok_or_else(|| CliParseError::MissingFlagValue("--url".to_string()))?;
                        overrides.base_url = Some(value.to_string());
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                    }
                }
            }

            if subcommand == "version" {
                CliCommand::Version
            } else {
                CliCommand::Health
            }
        }
        "star" | "unstar" => {
            let mut id: Option<String> = None;
            for arg in iter {
                if arg.starts_with('-') {
                    return Err(CliParseError::UnknownFlag(arg.to_string()));
                }
                if id.is_some() {
                    return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                }
                let trimmed = arg.trim();
                if !trimmed.is_empty() {
                    id = Some(trimmed.to_string());
                }
            }
            let id = id.ok_or(CliParseError::MissingSessionId)?;

            if subcommand == "star" {
                CliCommand::Star { id }
            } else {
                CliCommand::Unstar { id }
            }
        }
        "theme" => {
            let mut mode: Option<ThemeMode> = None;
            let mut palette: Option<ThemePalette> = None;

            let mut args = iter;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--palette" | "-p" => {
                        let value = args.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--palette".to_string())
                        })?;
                        palette = Some(ThemePalette::parse(value).ok_or_else(|| {
                            CliParseError::InvalidFlagValue {
                                flag: "--palette".to_string(),
                                value: value.to_string(),
                            }
                        })?);
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ if mode.is_none() => {
                        mode = Some(ThemeMode::parse(arg).ok_or_else(|| {
                            CliParseError::InvalidFlagValue {
                                flag: "mode".to_string(),
                                value: arg.to_string(),
                            }
                        })?);
                    }
                    _ => {
                        return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                    }
                }
            }

            CliCommand::Theme { mode, palette }
        }
        other => return Err(CliParseError::UnknownSubcommand(other.to_string())),
    };

    Ok(CliInvocation::Command { command, overrides })
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    StateDir(#[from] ResolveStateDirError),

    #[error(transparent)]
    LoadStars(#[from] LoadStarsError),

    #[error(transparent)]
    SaveStars(#[from] SaveStarsError),

    #[error(transparent)]
    LoadPreferences(#[from] LoadPreferencesError),

    #[error(transparent)]
    SavePreferences(#[from] SavePreferencesError),

    #[error("failed to encode json: {0}")]
    EncodeJson(#[from] serde_json::Error),

    #[error("backend unreachable at {url}: {source}")]
    Unreachable { url: String, source: ApiError },

    #[error(transparent)]
    WriteOutput(#[from] io::Error),
}

pub fn run(command: CliCommand, config: &DashboardConfig) -> Result<(), CliRunError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let client = ApiClient::new(config.base_url.clone());

    match command {
        CliCommand::Sessions { query, json } => {
            let snapshot = client.fetch_snapshot()?;
            let starred = match &config.state_dir {
                Some(dir) => load_stars(dir)?,
                None => BTreeSet::new(),
            };

            let all: Vec<&Session> = snapshot.sessions.iter().collect();
            let unparsed = count_unparsed_timestamps(&all, &snapshot.processes);
            if unparsed > 0 {
                tracing::debug!(count = unparsed, "sessions with unparseable updated_at");
            }

            let dashboard = derive_dashboard(
                &snapshot,
                query.as_deref().unwrap_or(""),
                &starred,
                OffsetDateTime::now_utc(),
            );

            let rows = dashboard.rows(&starred);
            if json {
                let text = serde_json::to_string_pretty(&rows)?;
                write_line(&mut out, &text)?;
                return Ok(());
            }

            for row in rows {
                let line = session_line(&row);
                if !write_line(&mut out, &line)? {
                    return Ok(());
                }
            }
            Ok(())
        }
        CliCommand::Version => {
            let info = client.fetch_version()?;
            let latest = info.latest.as_deref().unwrap_or("-");
            write_line(&mut out, &format!("current\t{}", info.current))?;
            write_line(&mut out, &format!("latest\t{latest}"))?;
            write_line(
                &mut out,
                &format!("update_available\t{}", info.update_available),
            )?;
            Ok(())
        }
        CliCommand::Health => match client.probe(PROBE_TIMEOUT) {
            Ok(()) => {
                write_line(&mut out, &format!("ok\t{}", client.base_url()))?;
                Ok(())
            }
            Err(source) => Err(CliRunError::Unreachable {
                url: client.base_url().to_string(),
                source,
            }),
        },
        CliCommand::Star { id } => {
            let dir = state_dir(config)?;
            let mut starred = load_stars(&dir)?;
            let changed = starred.insert(id.clone());
            if changed {
                save_stars(&dir, &starred)?;
            }
            write_line(&mut out, &format!("starred\t{id}"))?;
            Ok(())
        }
        CliCommand::Unstar { id } => {
            let dir = state_dir(config)?;
            let mut starred = load_stars(&dir)?;
            if starred.remove(&id) {
                save_stars(&dir, &starred)?;
            }
            write_line(&mut out, &format!("unstarred\t{id}"))?;
            Ok(())
        }
        CliCommand::Theme { mode, palette } => {
            let dir = state_dir(config)?;
            let mut store = PreferenceStore::load(&dir)?;
            let mut theme = store.theme();
            if mode.is_some() || palette.is_some() {
                if let Some(mode) = mode {
                    theme.mode = mode;
                }
                if let Some(palette) = palette {
                    theme.palette = palette;
                }
                store.set_theme(theme)?;
            }
            write_line(
                &mut out,
                &format!("{}\t{}", theme.mode.as_str(), theme.palette.as_str()),
            )?;
            Ok(())
        }
    }
}

fn state_dir(config: &DashboardConfig) -> Result<PathBuf, ResolveStateDirError> {
    match &config.state_dir {
        Some(dir) => Ok(dir.clone()),
        None => resolve_state_dir(),
    }
}

fn session_line(row: &DashboardRow<'_>) -> String {
    let state = row.state.map(|state| state.as_str()).unwrap_or("-");
    let marker = if row.starred { "*" } else { "" };
    format!(
        "{}\t{}\t{}\t{marker}{}\t{}",
        row.section.label().to_ascii_lowercase(),
        row.group,
        state,
        row.session.id,
        single_line(row.session.title())
    )
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}

fn parse_secs_flag(flag: &str, value: &str) -> Result<u64, CliParseError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        }),
    }
}
