use serde::Serialize;
use std::collections::BTreeMap;
use time::OffsetDateTime;

pub const DEFAULT_GROUP: &str = "General";
pub const UNTITLED_SESSION: &str = "(Untitled session)";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Waiting,
    Working,
    Thinking,
    Idle,
    Unknown,
}

impl SessionState {
    pub const ALL: [SessionState; 5] = [
        Self::Waiting,
        Self::Working,
        Self::Thinking,
        Self::Idle,
        Self::Unknown,
    ];

    /// Unrecognized tags collapse to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == tag)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Working => "working",
            Self::Thinking => "thinking",
            Self::Idle => "idle",
            Self::Unknown => "unknown",
        }
    }
}

/// One polled session. Built only through `Session::from_record`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Session {
    pub id: String,
    pub cwd: Option<String>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub summary: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(skip)]
    pub created_at_parsed: Option<OffsetDateTime>,
    #[serde(skip)]
    pub updated_at_parsed: Option<OffsetDateTime>,
    pub created_ago: Option<String>,
    pub updated_ago: Option<String>,
    pub counters: SessionCounters,
    pub state: Option<SessionState>,
    pub group: String,
    pub mcp_servers: Vec<String>,
    pub intent: String,
    pub restart_command: String,
}

impl Session {
    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or(UNTITLED_SESSION)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SessionCounters {
    pub turns: u64,
    pub files: u64,
    pub checkpoints: u64,
    pub tool_calls: u64,
    pub subagent_runs: u64,
    pub background_tasks: u64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ProcessInfo {
    pub pid: Option<u32>,
    pub parent_pid: Option<u32>,
    pub terminal_pid: Option<u32>,
    pub command: String,
    pub yolo: bool,
    pub state: Option<SessionState>,
    pub background_tasks: u64,
    pub mcp_servers: Vec<String>,
}

pub type ProcessMap = BTreeMap<String, ProcessInfo>;

/// Full state of the backend at one poll. Replaced wholesale, never patched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    pub sessions: Vec<Session>,
    pub processes: ProcessMap,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, Serialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub update_available: bool,
}
