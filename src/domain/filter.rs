use crate::domain::Session;
use std::borrow::Cow;

/// Case-insensitive substring search over the human-facing session fields.
///
/// An empty query is the identity: the input slice is handed back borrowed.
/// Whitespace is part of the query and is matched literally.
pub fn filter_sessions<'s, 'a>(
    sessions: &'s [&'a Session],
    query: &str,
) -> Cow<'s, [&'a Session]> {
    if query.is_empty() {
        return Cow::Borrowed(sessions);
    }
    let query = query.to_lowercase();

    Cow::Owned(
        sessions
            .iter()
            .copied()
            .filter(|session| session_haystack(session).contains(&query))
            .collect(),
    )
}

fn session_haystack(session: &Session) -> String {
    let servers = session.mcp_servers.join(" ");
    let fields = [
        session.summary.as_deref(),
        session.repository.as_deref(),
        session.branch.as_deref(),
        session.cwd.as_deref(),
        Some(session.group.as_str()),
        Some(session.intent.as_str()),
        Some(servers.as_str()),
    ];

    fields
        .into_iter()
        .flatten()
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionRecord, parse_sessions_json};

    fn session(id: &str) -> Session {
        Session::from_record(SessionRecord {
            id: id.to_string(),
            ..SessionRecord::default()
        })
    }

    #[test]
    fn empty_query_is_identity() {
        let a = session("1");
        let b = session("2");
        let input = vec![&a, &b];

        let result = filter_sessions(&input, "");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.len(), 2);
        assert!(std::ptr::eq(result[0], &a));

    }

    #[test]
    fn whitespace_is_matched_literally() {
        let mut spaced = session("1");
        spaced.summary = Some("fix the build".to_string());
        let mut solid = session("2");
        solid.summary = Some("foo".to_string());
        let input = vec![&spaced, &solid];

        let ids = |query: &str| {
            filter_sessions(&input, query)
                .iter()
                .map(|s| s.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(" "), vec!["1"]);
        assert!(ids(" foo").is_empty());
        assert_eq!(ids("foo"), vec!["2"]);
    }

    #[test]
    fn matches_any_substring_of_summary() {
        let mut s = session("1");
        s.summary = Some("Refactor Parser".to_string());
        let input = vec![&s];

        for query in ["Refactor", "parser", "r p", "ACTOR PAR"] {
            let result = filter_sessions(&input, query);
            assert_eq!(result.len(), 1, "query {query:?}");
        }
        assert!(filter_sessions(&input, "lexer").is_empty());
    }

    #[test]
    fn searches_repository_branch_cwd_group_intent_and_servers() {
        let sessions = parse_sessions_json(
            r#"[
                {"id":"1","repository":"acme/widgets"},
                {"id":"2","branch":"feature/login"},
                {"id":"3","cwd":"/home/dev/infra"},
                {"id":"4","group":"payments"},
                {"id":"5","intent":"write docs"},
                {"id":"6","mcp_servers":["github","linear"]}
            ]"#,
        )
        .expect("parse");
        let refs: Vec<&Session> = sessions.iter().collect();

        let ids = |query: &str| {
            filter_sessions(&refs, query)
                .iter()
                .map(|s| s.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids("widgets"), vec!["1"]);
        assert_eq!(ids("LOGIN"), vec!["2"]);
        assert_eq!(ids("/infra"), vec!["3"]);
        assert_eq!(ids("payments"), vec!["4"]);
        assert_eq!(ids("docs"), vec!["5"]);
        assert_eq!(ids("linear"), vec!["6"]);
        // "General" is the default group of every session without one.
        assert_eq!(ids("general").len(), 5);
    }

    #[test]
    fn keeps_input_order() {
        let mut a = session("a");
        a.summary = Some("deploy api".to_string());
        let b = session("b");
        let mut c = session("c");
        c.summary = Some("deploy web".to_string());
        let input = vec![&a, &b, &c];

        let result = filter_sessions(&input, "deploy");
        let ids: Vec<&str> = result.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
