use crate::domain::Session;
use std::collections::BTreeSet;

/// Starred sessions first, relative order otherwise untouched.
pub fn sort_starred<'a>(
    sessions: &[&'a Session],
    starred: &BTreeSet<String>,
) -> Vec<&'a Session> {
    let mut ordered = sessions.to_vec();
    ordered.sort_by_key(|session| !starred.contains(&session.id));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionRecord;

    fn session(id: &str) -> Session {
        Session::from_record(SessionRecord {
            id: id.to_string(),
            ..SessionRecord::default()
        })
    }

    fn starred(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn ids(list: &[&Session]) -> Vec<String> {
        list.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn starred_session_moves_to_front() {
        let sessions = [session("1"), session("2"), session("3")];
        let refs: Vec<&Session> = sessions.iter().collect();
        let sorted = sort_starred(&refs, &starred(&["3"]));
        assert_eq!(ids(&sorted), vec!["3", "1", "2"]);
        assert_eq!(ids(&refs), vec!["1", "2", "3"]);
    }

    #[test]
    fn both_subsets_keep_input_order() {
        let sessions = [
            session("a"),
            session("b"),
            session("c"),
            session("d"),
            session("e"),
        ];
        let refs: Vec<&Session> = sessions.iter().collect();
        let sorted = sort_starred(&refs, &starred(&["d", "b"]));
        assert_eq!(ids(&sorted), vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn no_stars_is_a_no_op() {
        let sessions = [session("x"), session("y")];
        let refs: Vec<&Session> = sessions.iter().collect();
        let sorted = sort_starred(&refs, &BTreeSet::new());
        assert_eq!(ids(&sorted), vec!["x", "y"]);
    }

    #[test]
    fn unknown_starred_ids_are_ignored() {
        let sessions = [session("x"), session("y")];
        let refs: Vec<&Session> = sessions.iter().collect();
        let sorted = sort_starred(&refs, &starred(&["gone", "y"]));
        assert_eq!(ids(&sorted), vec!["y", "x"]);
    }
}
