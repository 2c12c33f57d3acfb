// Event kind vocabulary
//
// The set of kinds is open-ended: producers are external processes and may
// emit kinds this build has never heard of. Unknown strings are preserved
// in Other rather than rejected, so new producer-side kinds degrade
// gracefully instead of breaking deserialization.

use serde::{Deserialize, Serialize};

/// Lifecycle event kind, as named on the producer wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    SessionStart,
    SessionEnd,
    UserPromptSubmit,
    PreToolUse,
    PostToolUse,
    PostToolUseFailure,
    PermissionRequest,
    Notification,
    SubagentStart,
    SubagentStop,
    PreCompact,
    TokenUsage,
    /// Any kind this build does not know about. Stored, broadcast, and
    /// queried like every other kind.
    Other(String),
}

impl EventKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::SessionStart => "SessionStart",
            EventKind::SessionEnd => "SessionEnd",
            EventKind::UserPromptSubmit => "UserPromptSubmit",
            EventKind::PreToolUse => "PreToolUse",
            EventKind::PostToolUse => "PostToolUse",
            EventKind::PostToolUseFailure => "PostToolUseFailure",
            EventKind::PermissionRequest => "PermissionRequest",
            EventKind::Notification => "Notification",
            EventKind::SubagentStart => "SubagentStart",
            EventKind::SubagentStop => "SubagentStop",
            EventKind::PreCompact => "PreCompact",
            EventKind::TokenUsage => "TokenUsage",
            EventKind::Other(s) => s,
        }
    }

    /// True for the completion half of a tool invocation (success or failure).
    pub fn is_tool_completion(&self) -> bool {
        matches!(self, EventKind::PostToolUse | EventKind::PostToolUseFailure)
    }

    /// True for kinds that carry an authoritative occurrence time in their
    /// payload. The ingestion layer must prefer that time over its own clock.
    pub fn has_embedded_occurrence_time(&self) -> bool {
        matches!(self, EventKind::TokenUsage)
    }

    /// True for kinds that can flip a session into the alerting state
    /// (a terminal or attention-requesting event).
    pub fn is_attention(&self) -> bool {
        matches!(self, EventKind::Notification | EventKind::SessionEnd)
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SessionStart" => EventKind::SessionStart,
            "SessionEnd" => EventKind::SessionEnd,
            "UserPromptSubmit" => EventKind::UserPromptSubmit,
            "PreToolUse" => EventKind::PreToolUse,
            "PostToolUse" => EventKind::PostToolUse,
            "PostToolUseFailure" => EventKind::PostToolUseFailure,
            "PermissionRequest" => EventKind::PermissionRequest,
            "Notification" => EventKind::Notification,
            "SubagentStart" => EventKind::SubagentStart,
            "SubagentStop" => EventKind::SubagentStop,
            "PreCompact" => EventKind::PreCompact,
            "TokenUsage" => EventKind::TokenUsage,
            _ => EventKind::Other(s),
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        EventKind::from(s.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_kinds_round_trip() {
        for name in [
            "SessionStart",
            "PreToolUse",
            "PostToolUseFailure",
            "TokenUsage",
        ] {
            let kind = EventKind::from(name);
            assert!(!matches!(kind, EventKind::Other(_)), "{name} should be known");
            assert_eq!(kind.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_kind_preserved() {
        let kind = EventKind::from("SomeFutureHook");
        assert_eq!(kind, EventKind::Other("SomeFutureHook".to_string()));
        assert_eq!(kind.as_str(), "SomeFutureHook");

        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"SomeFutureHook\"");
        let back: EventKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let kind: EventKind = serde_json::from_str("\"PostToolUse\"").unwrap();
        assert_eq!(kind, EventKind::PostToolUse);
        assert!(kind.is_tool_completion());
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"PostToolUse\"");
    }
}
