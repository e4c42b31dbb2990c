use crate::domain::Session;
use std::collections::HashMap;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionGroup<'a> {
    pub key: &'a str,
    pub sessions: Vec<&'a Session>,
}

/// Buckets sessions by `group`, keeping member order, then orders buckets by
/// descending size. Equal-sized buckets stay in first-seen order.
pub fn group_sessions<'a>(sessions: &[&'a Session]) -> Vec<SessionGroup<'a>> {
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<SessionGroup<'a>> = Vec::new();

    for session in sessions.iter().copied() {
        let key = session.group.as_str();
        match positions.get(key) {
            Some(&index) => groups[index].sessions.push(session),
            None => {
                positions.insert(key, groups.len());
                groups.push(SessionGroup {
                    key,
                    sessions: vec![session],
                });
            }
        }
    }

    groups.sort_by(|a, b| b.sessions.len().cmp(&a.sessions.len()));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DEFAULT_GROUP, SessionRecord};

    fn session(id: &str, group: Option<&str>) -> Session {
        Session::from_record(SessionRecord {
            id: id.to_string(),
            group: group.map(str::to_string),
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
    fn groups_by_key_and_sorts_by_size() {
        let sessions = [
            session("1", Some("B")),
            session("2", Some("A")),
            session("3", Some("A")),
            session("4", Some("C")),
            session("5", Some("A")),
            session("6", Some("C")),
        ];
        let refs: Vec<&Session> = sessions.iter().collect();

        let groups = group_sessions(&refs);
        assert_eq!(
            shape(&groups),
            vec![
                ("A".to_string(), vec!["2".to_string(), "3".to_string(), "5".to_string()]),
                ("C".to_string(), vec!["4".to_string(), "6".to_string()]),
                ("B".to_string(), vec!["1".to_string()]),
            ]
        );
        for pair in groups.windows(2) {
            assert!(pair[0].sessions.len() >= pair[1].sessions.len());
        }
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let sessions = [
            session("1", Some("x")),
            session("2", Some("y")),
            session("3", Some("z")),
        ];
        let refs: Vec<&Session> = sessions.iter().collect();
        let keys: Vec<&str> = group_sessions(&refs).iter().map(|g| g.key).collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
        let again: Vec<&str> = group_sessions(&refs).iter().map(|g| g.key).collect();
        assert_eq!(keys, again);
    }

    #[test]
    fn missing_group_lands_in_default_bucket() {
        let sessions = [session("1", None), session("2", Some("")), session("3", Some("app"))];
        let refs: Vec<&Session> = sessions.iter().collect();
        let groups = group_sessions(&refs);
        assert_eq!(groups[0].key, DEFAULT_GROUP);
        assert_eq!(groups[0].sessions.len(), 2);
    }

    #[test]
    fn every_session_appears_exactly_once() {
        let sessions = [
            session("1", Some("a")),
            session("2", Some("b")),
            session("3", Some("a")),
            session("4", None),
        ];
        let refs: Vec<&Session> = sessions.iter().collect();
        let groups = group_sessions(&refs);

        let mut seen: Vec<String> = groups
            .iter()
            .flat_map(|g| g.sessions.iter().map(|s| s.id.clone()))
            .collect();
        assert_eq!(seen.len(), refs.len());
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), refs.len());
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_sessions(&[]).is_empty());
    }
}
