use crate::domain::{
    DEFAULT_GROUP, ProcessInfo, ProcessMap, Session, SessionCounters, SessionState,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wire shape of a session. Only `id` is required. Every other field is
/// optional, and a value of the wrong type reads as absent; defaults are
/// filled in by `Session::from_record`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub cwd: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub repository: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub branch: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_ago: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_ago: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub turn_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub file_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub checkpoint_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub tool_call_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub subagent_run_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub background_task_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub mcp_servers: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub intent: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub restart_command: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProcessRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub pid: Option<u32>,
    #[serde(default, alias = "ppid", deserialize_with = "lenient")]
    pub parent_pid: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub terminal_pid: Option<u32>,
    #[serde(default, alias = "cmdline", deserialize_with = "lenient")]
    pub command: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub yolo: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub background_tasks: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub mcp_servers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionsPayload {
    List(Vec<Value>),
    Wrapped { sessions: Vec<Value> },
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl Session {
    /// Ingestion boundary: blank text becomes `None`, a missing group becomes
    /// `DEFAULT_GROUP`, timestamps that fail RFC 3339 parsing stay unparsed.
    pub fn from_record(record: SessionRecord) -> Self {
        let created_at_parsed = record.created_at.as_deref().and_then(parse_timestamp);
        let updated_at_parsed = record.updated_at.as_deref().and_then(parse_timestamp);
        let group = non_blank(record.group).unwrap_or_else(|| DEFAULT_GROUP.to_string());

        Self {
            id: record.id,
            cwd: non_blank(record.cwd),
            repository: non_blank(record.repository),
            branch: non_blank(record.branch),
            summary: non_blank(record.summary),
            created_at: record.created_at,
            updated_at: record.updated_at,
            created_at_parsed,
            updated_at_parsed,
            created_ago: non_blank(record.created_ago),
            updated_ago: non_blank(record.updated_ago),
            counters: SessionCounters {
                turns: record.turn_count.unwrap_or(0),
                files: record.file_count.unwrap_or(0),
                checkpoints: record.checkpoint_count.unwrap_or(0),
                tool_calls: record.tool_call_count.unwrap_or(0),
                subagent_runs: record.subagent_run_count.unwrap_or(0),
                background_tasks: record.background_task_count.unwrap_or(0),
            },
            state: record.state.as_deref().map(SessionState::from_tag),
            group,
            mcp_servers: clean_names(record.mcp_servers),
            intent: record.intent.unwrap_or_default(),
            restart_command: record.restart_command.unwrap_or_default(),
        }
    }
}

impl ProcessInfo {
    pub fn from_record(record: ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            parent_pid: record.parent_pid,
            terminal_pid: record.terminal_pid,
            command: record.command.unwrap_or_default(),
            yolo: record.yolo.unwrap_or(false),
            state: record.state.as_deref().map(SessionState::from_tag),
            background_tasks: record.background_tasks.unwrap_or(0),
            mcp_servers: clean_names(record.mcp_servers),
        }
    }
}

/// Only a payload that is not a session list at all is an error. A record
/// without a usable `id` is skipped; the rest of the batch still ingests.
pub fn parse_sessions_json(text: &str) -> Result<Vec<Session>, ParseError> {
    let payload: SessionsPayload = serde_json::from_str(text)?;
    let records = match payload {
        SessionsPayload::List(records) => records,
        SessionsPayload::Wrapped { sessions } => sessions,
    };

    let mut sessions = Vec::with_capacity(records.len());
    for (index, value) in records.into_iter().enumerate() {
        match serde_json::from_value::<SessionRecord>(value) {
            Ok(record) => sessions.push(Session::from_record(record)),
            Err(error) => warn!(index, %error, "skipping malformed session record"),
        }
    }
    Ok(sessions)
}

/// An entry that is not an object still marks its session as running.
pub fn parse_processes_json(text: &str) -> Result<ProcessMap, ParseError> {
    let records: BTreeMap<String, Value> = serde_json::from_str(text)?;
    Ok(records
        .into_iter()
        .map(|(id, value)| {
            let record = serde_json::from_value::<ProcessRecord>(value).unwrap_or_else(|error| {
                warn!(session = %id, %error, "unreadable process entry");
                ProcessRecord::default()
            });
            (id, ProcessInfo::from_record(record))
        })
        .collect())
}

pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == value.len() {
            Some(value)
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn clean_names(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter(|name| !name.trim().is_empty())
        .collect()
}
