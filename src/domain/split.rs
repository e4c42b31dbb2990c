use crate::domain::{ProcessMap, Session, SessionState};
use time::{Duration, OffsetDateTime};

/// How far back an inactive session still counts as "previous".
pub const PREVIOUS_WINDOW: Duration = Duration::days(5);

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SplitSessions<'a> {
    pub active: Vec<&'a Session>,
    pub previous: Vec<&'a Session>,
}

/// Stable partition into running sessions (those with a live process entry)
/// and recently updated ones. Everything else is dropped.
///
/// A session whose `updated_at` did not parse never qualifies as previous.
pub fn split_sessions<'a>(
    sessions: &[&'a Session],
    processes: &ProcessMap,
    now: OffsetDateTime,
) -> SplitSessions<'a> {
    let cutoff = now - PREVIOUS_WINDOW;
    let mut split = SplitSessions::default();

    for session in sessions.iter().copied() {
        if processes.contains_key(&session.id) {
            split.active.push(session);
        } else if session
            .updated_at_parsed
            .is_some_and(|updated_at| updated_at >= cutoff)
        {
            split.previous.push(session);
        }
    }

    split
}

/// Sessions kept out of "previous" only because `updated_at` did not parse.
/// Running sessions are shown regardless and are not counted.
pub fn count_unparsed_timestamps(sessions: &[&Session], processes: &ProcessMap) -> usize {
    sessions
        .iter()
        .filter(|session| {
            session.updated_at_parsed.is_none() && !processes.contains_key(&session.id)
        })
        .count()
}

/// The live process state wins over the last state recorded on the session.
pub fn live_state(session: &Session, processes: &ProcessMap) -> Option<SessionState> {
    processes
        .get(&session.id)
        .and_then(|process| process.state)
        .or(session.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProcessInfo, SessionRecord};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-10-16 12:00 UTC);

    fn session(id: &str, updated_at: &str) -> Session {
        Session::from_record(SessionRecord {
            id: id.to_string(),
            updated_at: Some(updated_at.to_string()),
            ..SessionRecord::default()
        })
    }

    fn ids(list: &[&Session]) -> Vec<String> {
        list.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn active_wins_regardless_of_age() {
        let old = session("old", "2020-01-01T00:00:00Z");
        let fresh = session("fresh", "2026-10-16T11:00:00Z");
        let input = vec![&old, &fresh];
        let mut processes = ProcessMap::new();
        processes.insert("old".to_string(), ProcessInfo::default());
        processes.insert("fresh".to_string(), ProcessInfo::default());

        let split = split_sessions(&input, &processes, NOW);
        assert_eq!(ids(&split.active), vec!["old", "fresh"]);
        assert!(split.previous.is_empty());
    }

    #[test]
    fn drops_inactive_sessions_older_than_window() {
        let recent = session("recent", "2026-10-12T12:00:00Z");
        let edge = session("edge", "2026-10-11T12:00:00Z");
        let stale = session("stale", "2026-10-11T11:59:59Z");
        let input = vec![&recent, &edge, &stale];

        let split = split_sessions(&input, &ProcessMap::new(), NOW);
        assert!(split.active.is_empty());
        assert_eq!(ids(&split.previous), vec!["recent", "edge"]);
    }

    #[test]
    fn unparseable_timestamp_is_excluded_from_previous() {
        let broken = session("broken", "not-a-date");
        let missing = Session::from_record(SessionRecord {
            id: "missing".to_string(),
            ..SessionRecord::default()
        });
        let input = vec![&broken, &missing];

        let split = split_sessions(&input, &ProcessMap::new(), NOW);
        assert!(split.previous.is_empty());
        assert_eq!(count_unparsed_timestamps(&input, &ProcessMap::new()), 2);

        let mut processes = ProcessMap::new();
        processes.insert("broken".to_string(), ProcessInfo::default());
        let split = split_sessions(&input, &processes, NOW);
        assert_eq!(ids(&split.active), vec!["broken"]);
        assert_eq!(count_unparsed_timestamps(&input, &processes), 1);
    }

    #[test]
    fn partition_keeps_input_order_and_never_duplicates() {
        let a = session("a", "2026-10-16T10:00:00Z");
        let b = session("b", "2026-10-15T10:00:00Z");
        let c = session("c", "2026-10-14T10:00:00Z");
        let d = session("d", "2026-10-13T10:00:00Z");
        let input = vec![&a, &b, &c, &d];
        let mut processes = ProcessMap::new();
        processes.insert("b".to_string(), ProcessInfo::default());
        processes.insert("d".to_string(), ProcessInfo::default());
        processes.insert("zzz".to_string(), ProcessInfo::default());

        let split = split_sessions(&input, &processes, NOW);
        assert_eq!(ids(&split.active), vec!["b", "d"]);
        assert_eq!(ids(&split.previous), vec!["a", "c"]);
        for id in ids(&split.active) {
            assert!(!ids(&split.previous).contains(&id));
        }
    }

    #[test]
    fn live_state_prefers_the_process() {
        let mut recorded = session("s1", "2026-10-16T10:00:00Z");
        recorded.state = Some(SessionState::Working);
        let bare = session("s2", "2026-10-16T10:00:00Z");

        let mut processes = ProcessMap::new();
        processes.insert(
            "s1".to_string(),
            ProcessInfo {
                state: Some(SessionState::Waiting),
                ..ProcessInfo::default()
            },
        );
        processes.insert("s2".to_string(), ProcessInfo::default());

        assert_eq!(live_state(&recorded, &processes), Some(SessionState::Waiting));
        assert_eq!(live_state(&recorded, &ProcessMap::new()), Some(SessionState::Working));
        assert_eq!(live_state(&bare, &processes), None);
    }

    #[test]
    fn future_timestamps_count_as_recent() {
        let ahead = session("ahead", "2026-10-17T00:00:00Z");
        let input = vec![&ahead];
        let split = split_sessions(&input, &ProcessMap::new(), NOW);
        assert_eq!(ids(&split.previous), vec!["ahead"]);
    }
}
