use crate::domain::{Snapshot, VersionInfo, parse_processes_json, parse_sessions_json};
use std::time::Duration;
use thiserror::Error;

const BIN_NAME: &str = "ccdash";

pub const SESSIONS_PATH: &str = "/api/sessions";
pub const PROCESSES_PATH: &str = "/api/processes";
pub const SERVER_INFO_PATH: &str = "/api/server-info";
pub const VERSION_PATH: &str = "/api/version";
pub const UPDATE_PATH: &str = "/api/update";

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(4);
pub const READY_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const DATA_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Blocking client for the dashboard backend. Every call builds an agent with
/// its own global timeout, so a slow endpoint never stalls a probe.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fetch_snapshot(&self) -> Result<Snapshot, ApiError> {
        let sessions_url = self.url(SESSIONS_PATH);
        let text = self.get_text(&sessions_url, DATA_TIMEOUT)?;
        let sessions = parse_sessions_json(&text).map_err(|error| ApiError::Decode {
            url: sessions_url.clone(),
            message: error.to_string(),
        })?;

        let processes_url = self.url(PROCESSES_PATH);
        let text = self.get_text(&processes_url, DATA_TIMEOUT)?;
        let processes = parse_processes_json(&text).map_err(|error| ApiError::Decode {
            url: processes_url.clone(),
            message: error.to_string(),
        })?;

        Ok(Snapshot {
            sessions,
            processes,
        })
    }

    /// Any 2xx from the server-info endpoint counts as alive.
    pub fn probe(&self, timeout: Duration) -> Result<(), ApiError> {
        let url = self.url(SERVER_INFO_PATH);
        let agent = make_agent(timeout);
        agent
            .get(&url)
            .header("User-Agent", &user_agent())
            .call()
            .map_err(|error| map_ureq_error(&url, error))?;
        Ok(())
    }

    pub fn fetch_version(&self) -> Result<VersionInfo, ApiError> {
        let url = self.url(VERSION_PATH);
        let agent = make_agent(DATA_TIMEOUT);
        let mut response = agent
            .get(&url)
            .header("User-Agent", &user_agent())
            .header("Accept", "application/json")
            .call()
            .map_err(|error| map_ureq_error(&url, error))?;

        response
            .body_mut()
            .read_json::<VersionInfo>()
            .map_err(|error| ApiError::Decode {
                url,
                message: error.to_string(),
            })
    }

    pub fn trigger_update(&self) -> Result<(), ApiError> {
        let url = self.url(UPDATE_PATH);
        let agent = make_agent(DATA_TIMEOUT);
        agent
            .post(&url)
            .header("User-Agent", &user_agent())
            .send_empty()
            .map_err(|error| map_ureq_error(&url, error))?;
        Ok(())
    }

    fn get_text(&self, url: &str, timeout: Duration) -> Result<String, ApiError> {
        let agent = make_agent(timeout);
        let mut response = agent
            .get(url)
            .header("User-Agent", &user_agent())
            .header("Accept", "application/json")
            .call()
            .map_err(|error| map_ureq_error(url, error))?;

        response
            .body_mut()
            .read_to_string()
            .map_err(|error| ApiError::Decode {
                url: url.to_string(),
                message: error.to_string(),
            })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn user_agent() -> String {
    format!("{BIN_NAME}/{}", env!("CARGO_PKG_VERSION"))
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    config.into()
}

fn map_ureq_error(url: &str, error: ureq::Error) -> ApiError {
    match error {
        ureq::Error::StatusCode(status) => ApiError::Status {
            url: url.to_string(),
            status,
        },
        other => ApiError::Transport {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(
            join_url("http://host:1", "/api/version"),
            "http://host:1/api/version"
        );
        assert_eq!(
            join_url("http://host:1/base/", "api/sessions"),
            "http://host:1/base/api/sessions"
        );
    }

    #[test]
    fn status_errors_keep_the_code() {
        let error = map_ureq_error("http://host/api", ureq::Error::StatusCode(503));
        assert!(matches!(error, ApiError::Status { status: 503, .. }));
        assert_eq!(error.to_string(), "http://host/api returned HTTP 503");
    }
}
