use crate::domain::{
    Classification, ProcessMap, Session, SessionGroup, SessionState, Snapshot, classify,
    filter_sessions, group_sessions, live_state, sort_starred, split_sessions,
};
use serde::Serialize;
use std::collections::BTreeSet;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Active,
    Previous,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Previous => "Previous",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Dashboard<'a> {
    pub active: Vec<SessionGroup<'a>>,
    pub previous: Vec<SessionGroup<'a>>,
    processes: Option<&'a ProcessMap>,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct DashboardRow<'a> {
    pub section: Section,
    pub group: &'a str,
    pub session: &'a Session,
    pub starred: bool,
    /// Live process state for running sessions, else the recorded one.
    pub state: Option<SessionState>,
    pub class: Classification,
}

impl<'a> Dashboard<'a> {
    pub fn active_count(&self) -> usize {
        self.active.iter().map(|group| group.sessions.len()).sum()
    }

    pub fn previous_count(&self) -> usize {
        self.previous.iter().map(|group| group.sessions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.previous.is_empty()
    }

    /// Display order: active groups, then previous groups.
    pub fn ordered(&self) -> impl Iterator<Item = (Section, &SessionGroup<'a>)> + '_ {
        self.active
            .iter()
            .map(|group| (Section::Active, group))
            .chain(self.previous.iter().map(|group| (Section::Previous, group)))
    }

    pub fn rows(&self, starred: &BTreeSet<String>) -> Vec<DashboardRow<'a>> {
        let processes = self.processes;
        self.ordered()
            .flat_map(|(section, group)| {
                group.sessions.iter().copied().map(move |session| {
                    let state = match processes {
                        Some(processes) => live_state(session, processes),
                        None => session.state,
                    };
                    DashboardRow {
                        section,
                        group: group.key,
                        session,
                        starred: starred.contains(&session.id),
                        state,
                        class: classify(state, section == Section::Active),
                    }
                })
            })
            .collect()
    }
}

/// Runs filter, split, group and star ordering over one snapshot, in that order.
pub fn derive_dashboard<'a>(
    snapshot: &'a Snapshot,
    query: &str,
    starred: &BTreeSet<String>,
    now: OffsetDateTime,
) -> Dashboard<'a> {
    let all: Vec<&Session> = snapshot.sessions.iter().collect();
    let filtered = filter_sessions(&all, query);
    let split = split_sessions(&filtered, &snapshot.processes, now);

    let order = |groups: Vec<SessionGroup<'a>>| -> Vec<SessionGroup<'a>> {
        groups
            .into_iter()
            .map(|group| SessionGroup {
                key: group.key,
                sessions: sort_starred(&group.sessions, starred),
            })
            .collect()
    };

    Dashboard {
        active: order(group_sessions(&split.active)),
        previous: order(group_sessions(&split.previous)),
        processes: Some(&snapshot.processes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProcessInfo, ProcessMap, SessionRecord, SessionState};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-10-16 12:00 UTC);

    fn session(id: &str, group: &str) -> Session {
        Session::from_record(SessionRecord {
            id: id.to_string(),
            group: Some(group.to_string()),
            updated_at: Some("2026-10-15T08:00:00Z".to_string()),
            ..SessionRecord::default()
        })
    }

    fn shape(groups: &[SessionGroup<'_>]) -> Vec<(String, Vec<String>)> {
        groups
            .iter()
            .map(|group| {
                (
                    group.key.to_string(),
                    group.sessions.iter().map(|s| s.id.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn recent_sessions_without_processes_are_grouped_as_previous() {
        let snapshot = Snapshot {
            sessions: vec![session("1", "A"), session("2", "A"), session("3", "B")],
            processes: ProcessMap::new(),
        };

        let dashboard = derive_dashboard(&snapshot, "", &BTreeSet::new(), NOW);
        assert!(dashboard.active.is_empty());
        assert_eq!(
            shape(&dashboard.previous),
            vec![
                ("A".to_string(), vec!["1".to_string(), "2".to_string()]),
                ("B".to_string(), vec!["3".to_string()]),
            ]
        );
        assert_eq!(dashboard.previous_count(), 3);
    }

    #[test]
    fn starred_sessions_lead_their_group() {
        let snapshot = Snapshot {
            sessions: vec![session("1", "A"), session("2", "A"), session("3", "A")],
            processes: ProcessMap::new(),
        };
        let starred: BTreeSet<String> = ["3".to_string()].into_iter().collect();

        let dashboard = derive_dashboard(&snapshot, "", &starred, NOW);
        assert_eq!(
            shape(&dashboard.previous),
            vec![(
                "A".to_string(),
                vec!["3".to_string(), "1".to_string(), "2".to_string()]
            )]
        );
    }

    #[test]
    fn query_applies_before_split() {
        let mut running = session("run", "A");
        running.summary = Some("ship release".to_string());
        let mut idle = session("idle", "B");
        idle.summary = Some("ship docs".to_string());
        let other = session("other", "B");
        let mut processes = ProcessMap::new();
        processes.insert("run".to_string(), ProcessInfo::default());
        let snapshot = Snapshot {
            sessions: vec![running, idle, other],
            processes,
        };

        let dashboard = derive_dashboard(&snapshot, "ship", &BTreeSet::new(), NOW);
        assert_eq!(shape(&dashboard.active), vec![("A".to_string(), vec!["run".to_string()])]);
        assert_eq!(
            shape(&dashboard.previous),
            vec![("B".to_string(), vec!["idle".to_string()])]
        );
    }

    #[test]
    fn rows_follow_display_order_and_classify_by_section() {
        let mut running = session("run", "A");
        running.state = Some(SessionState::Waiting);
        let mut stopped = session("stopped", "A");
        stopped.state = Some(SessionState::Waiting);
        let mut processes = ProcessMap::new();
        processes.insert("run".to_string(), ProcessInfo::default());
        let snapshot = Snapshot {
            sessions: vec![stopped, running],
            processes,
        };
        let starred: BTreeSet<String> = ["stopped".to_string()].into_iter().collect();

        let dashboard = derive_dashboard(&snapshot, "", &starred, NOW);
        let rows = dashboard.rows(&starred);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].session.id, "run");
        assert_eq!(rows[0].section, Section::Active);
        assert_eq!(rows[0].class.row, crate::domain::RowTone::Waiting);
        assert!(!rows[0].starred);
        assert_eq!(rows[1].session.id, "stopped");
        assert_eq!(rows[1].class.row, crate::domain::RowTone::Default);
        assert!(rows[1].starred);
    }

    #[test]
    fn running_rows_take_state_from_the_process() {
        let running = session("run", "A");
        let mut processes = ProcessMap::new();
        processes.insert(
            "run".to_string(),
            ProcessInfo {
                state: Some(SessionState::Waiting),
                ..ProcessInfo::default()
            },
        );
        let snapshot = Snapshot {
            sessions: vec![running],
            processes,
        };

        let dashboard = derive_dashboard(&snapshot, "", &BTreeSet::new(), NOW);
        let rows = dashboard.rows(&BTreeSet::new());
        assert_eq!(rows[0].state, Some(SessionState::Waiting));
        assert_eq!(rows[0].class.label, "⏳ Waiting");
        assert_eq!(rows[0].class.row, crate::domain::RowTone::Waiting);
    }

    #[test]
    fn rows_serialize_with_section_and_style_tags() {
        let mut running = session("run", "A");
        running.state = Some(SessionState::Working);
        let mut processes = ProcessMap::new();
        processes.insert("run".to_string(), ProcessInfo::default());
        let snapshot = Snapshot {
            sessions: vec![running],
            processes,
        };

        let dashboard = derive_dashboard(&snapshot, "", &BTreeSet::new(), NOW);
        let value = serde_json::to_value(dashboard.rows(&BTreeSet::new())).expect("json");
        let row = &value[0];
        assert_eq!(row["section"], "active");
        assert_eq!(row["group"], "A");
        assert_eq!(row["starred"], false);
        assert_eq!(row["session"]["id"], "run");
        assert_eq!(row["session"]["state"], "working");
        assert_eq!(row["state"], "working");
        assert_eq!(row["class"]["badge"], "badge-working");
        assert_eq!(row["class"]["row"], "row-active");
    }

    #[test]
    fn empty_snapshot_yields_empty_dashboard() {
        let snapshot = Snapshot::default();
        let dashboard = derive_dashboard(&snapshot, "x", &BTreeSet::new(), NOW);
        assert!(dashboard.is_empty());
        assert_eq!(dashboard.active_count(), 0);
    }
}
