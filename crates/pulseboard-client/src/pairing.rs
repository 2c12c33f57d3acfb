// Tool event pairing
//
// A PreToolUse and a later PostToolUse(Failure) for the same tool in the
// same session form one logical invocation; the dashboard draws them as a
// connected span. Matching is greedy first-match: the earliest unmatched
// pre-event pairs with the next completion for that (session, tool). A
// pending-match table keeps this linear in event count.

use std::collections::{HashMap, VecDeque};

use pulseboard_core::{Event, EventKind};

/// One matched pre/post tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPair {
    pub session_id: String,
    pub tool_name: String,
    pub pre_id: i64,
    pub post_id: i64,
    pub failed: bool,
}

/// Pair tool events. `events` must be in (timestamp, id) ascending order;
/// given the same ordered input this always produces the same pairs.
pub fn pair_events<'a, I>(events: I) -> Vec<ToolPair>
where
    I: IntoIterator<Item = &'a Event>,
{
    // (session_id, tool_name) -> ids of pre-events awaiting completion
    let mut pending: HashMap<(String, String), VecDeque<i64>> = HashMap::new();
    let mut pairs = Vec::new();

    for event in events {
        let Some(tool_name) = event.tool_name.as_deref() else {
            continue;
        };
        let key = (event.session_id.clone(), tool_name.to_string());

        match &event.kind {
            EventKind::PreToolUse => {
                pending.entry(key).or_default().push_back(event.id);
            }
            kind if kind.is_tool_completion() => {
                if let Some(pre_id) = pending.get_mut(&key).and_then(VecDeque::pop_front) {
                    pairs.push(ToolPair {
                        session_id: event.session_id.clone(),
                        tool_name: tool_name.to_string(),
                        pre_id,
                        post_id: event.id,
                        failed: event.kind == EventKind::PostToolUseFailure,
                    });
                }
            }
            _ => {}
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: i64, timestamp: i64, session_id: &str, kind: EventKind, tool: &str) -> Event {
        Event {
            id,
            timestamp,
            session_id: session_id.to_string(),
            kind,
            source_app: None,
            model_name: None,
            tool_name: Some(tool.to_string()),
            payload: None,
            summary: None,
        }
    }

    #[test]
    fn test_pairs_pre_with_next_post_for_same_tool() {
        let events = vec![
            event(1, 1000, "s1", EventKind::PreToolUse, "Read"),
            event(2, 1500, "s1", EventKind::PostToolUse, "Read"),
        ];

        let pairs = pair_events(&events);
        assert_eq!(
            pairs,
            vec![ToolPair {
                session_id: "s1".to_string(),
                tool_name: "Read".to_string(),
                pre_id: 1,
                post_id: 2,
                failed: false,
            }]
        );
    }

    #[test]
    fn test_greedy_first_match_takes_earliest_pending_pre() {
        let events = vec![
            event(1, 1000, "s1", EventKind::PreToolUse, "Bash"),
            event(2, 1100, "s1", EventKind::PreToolUse, "Bash"),
            event(3, 1200, "s1", EventKind::PostToolUse, "Bash"),
            event(4, 1300, "s1", EventKind::PostToolUseFailure, "Bash"),
        ];

        let pairs = pair_events(&events);
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].pre_id, pairs[0].post_id), (1, 3));
        assert!(!pairs[0].failed);
        assert_eq!((pairs[1].pre_id, pairs[1].post_id), (2, 4));
        assert!(pairs[1].failed);
    }

    #[test]
    fn test_no_pairing_across_sessions_or_tools() {
        let events = vec![
            event(1, 1000, "s1", EventKind::PreToolUse, "Read"),
            event(2, 1100, "s2", EventKind::PostToolUse, "Read"),
            event(3, 1200, "s1", EventKind::PostToolUse, "Grep"),
        ];

        assert!(pair_events(&events).is_empty());
    }

    #[test]
    fn test_unmatched_completion_is_ignored() {
        let events = vec![event(1, 1000, "s1", EventKind::PostToolUse, "Read")];
        assert!(pair_events(&events).is_empty());
    }

    #[test]
    fn test_pairing_is_deterministic() {
        let events: Vec<Event> = (0..40)
            .map(|i| {
                let kind = if i % 2 == 0 {
                    EventKind::PreToolUse
                } else {
                    EventKind::PostToolUse
                };
                event(i, 1000 + i * 10, "s1", kind, if i % 4 < 2 { "Read" } else { "Bash" })
            })
            .collect();

        let first = pair_events(&events);
        let second = pair_events(&events);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
