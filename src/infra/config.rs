use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5173";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

const STATE_DIR_NAME: &str = ".ccdash";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DashboardConfig {
    pub base_url: String,
    pub poll_interval: Duration,
    pub state_dir: Option<PathBuf>,
}

/// Values given on the command line. They win over the environment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub poll_secs: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend url {value}: {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("invalid poll interval: {0}")]
    InvalidPollInterval(String),
}

#[derive(Debug, Error)]
pub enum ResolveStateDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

pub fn resolve_state_dir() -> Result<PathBuf, ResolveStateDirError> {
    if let Ok(value) = std::env::var("CCDASH_STATE_DIR") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    let Some(home) = dirs::home_dir() else {
        return Err(ResolveStateDirError::HomeDirNotFound);
    };
    Ok(home.join(STATE_DIR_NAME))
}

pub fn resolve_config(overrides: &ConfigOverrides) -> Result<DashboardConfig, ConfigError> {
    let env_url = std::env::var("CCDASH_URL").ok();
    let env_poll = std::env::var("CCDASH_POLL_SECS").ok();
    let state_dir = resolve_state_dir().ok();
    build_config(overrides, env_url.as_deref(), env_poll.as_deref(), state_dir)
}

fn build_config(
    overrides: &ConfigOverrides,
    env_url: Option<&str>,
    env_poll: Option<&str>,
    state_dir: Option<PathBuf>,
) -> Result<DashboardConfig, ConfigError> {
    let raw_url = overrides
        .base_url
        .as_deref()
        .or(env_url.filter(|value| !value.trim().is_empty()))
        .unwrap_or(DEFAULT_BASE_URL);
    let base_url = normalize_base_url(raw_url)?;

    let poll_secs = match (overrides.poll_secs, env_poll) {
        (Some(secs), _) => Some(secs),
        (None, Some(value)) if !value.trim().is_empty() => Some(
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidPollInterval(value.to_string()))?,
        ),
        _ => None,
    };
    let poll_interval = match poll_secs {
        Some(0) => return Err(ConfigError::InvalidPollInterval("0".to_string())),
        Some(secs) => Duration::from_secs(secs),
        None => DEFAULT_POLL_INTERVAL,
    };

    Ok(DashboardConfig {
        base_url,
        poll_interval,
        state_dir,
    })
}

pub fn normalize_base_url(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    let parsed = Url::parse(trimmed).map_err(|error| ConfigError::InvalidUrl {
        value: trimmed.to_string(),
        reason: error.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            value: trimmed.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_overrides() {
        let config = build_config(&ConfigOverrides::default(), None, None, None).expect("config");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.state_dir, None);
    }

    #[test]
    fn flags_beat_environment() {
        let overrides = ConfigOverrides {
            base_url: Some("http://flag.local:9000/".to_string()),
            poll_secs: Some(7),
        };
        let config = build_config(
            &overrides,
            Some("http://env.local:1"),
            Some("2"),
            Some(PathBuf::from("/tmp/state")),
        )
        .expect("config");
        assert_eq!(config.base_url, "http://flag.local:9000");
        assert_eq!(config.poll_interval, Duration::from_secs(7));
        assert_eq!(config.state_dir, Some(PathBuf::from("/tmp/state")));
    }

    #[test]
    fn environment_beats_defaults() {
        let config = build_config(
            &ConfigOverrides::default(),
            Some("https://dash.example.com/base/"),
            Some(" 10 "),
            None,
        )
        .expect("config");
        assert_eq!(config.base_url, "https://dash.example.com/base");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn rejects_bad_values() {
        let overrides = ConfigOverrides {
            base_url: Some("ftp://files.local".to_string()),
            poll_secs: None,
        };
        assert!(matches!(
            build_config(&overrides, None, None, None),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            build_config(&ConfigOverrides::default(), None, Some("soon"), None),
            Err(ConfigError::InvalidPollInterval(_))
        ));
        let zero = ConfigOverrides {
            base_url: None,
            poll_secs: Some(0),
        };
        assert!(matches!(
            build_config(&zero, None, None, None),
            Err(ConfigError::InvalidPollInterval(_))
        ));
    }
}
