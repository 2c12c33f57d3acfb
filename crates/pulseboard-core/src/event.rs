// Event entity type
//
// Event is the only persisted entity in the system. It is created once by
// the ingestion endpoint and never mutated; everything else (sessions,
// token series, tool stats) is computed from events at read time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::kind::EventKind;
use crate::token::occurrence_time_ms;

/// A persisted lifecycle event, as stored and as pushed to live clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Event {
    /// Store-assigned monotonically increasing id. Clients dedup on this.
    pub id: i64,
    /// Milliseconds since epoch of the underlying occurrence (not receipt).
    pub timestamp: i64,
    /// Opaque grouping key for one continuous run of the monitored process.
    pub session_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub kind: EventKind,
    /// Which monitored project produced the event, if known.
    pub source_app: Option<String>,
    pub model_name: Option<String>,
    pub tool_name: Option<String>,
    /// Kind-specific structured payload.
    pub payload: Option<Value>,
    /// Optional human-readable one-liner.
    pub summary: Option<String>,
}

/// Event as posted by a producer: the persisted shape minus the
/// store-assigned fields. `timestamp` may be omitted; the ingestion layer
/// resolves it (see [`IngestEvent::resolve_timestamp`]).
///
/// `hook_event_type` is accepted as an alias for `kind`: the field name
/// the session hooks use on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct IngestEvent {
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub session_id: String,
    #[serde(alias = "hook_event_type")]
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub kind: EventKind,
    #[serde(default)]
    pub source_app: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl IngestEvent {
    /// Validate required fields. Returns the first problem found.
    pub fn validate(&self) -> crate::Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(crate::PulseboardError::validation("session_id is required"));
        }
        if self.kind.as_str().trim().is_empty() {
            return Err(crate::PulseboardError::validation("kind is required"));
        }
        Ok(())
    }

    /// Resolve the event's occurrence timestamp, in order of authority:
    ///
    /// 1. the occurrence time embedded in the payload, for kinds that
    ///    carry one (token usage reports the API call's own clock);
    /// 2. the producer-supplied `timestamp` field;
    /// 3. `now_ms`, the ingestion wall clock.
    ///
    /// Getting this wrong corrupts every time-bucketed aggregate, so the
    /// embedded time always wins when present and parseable.
    pub fn resolve_timestamp(&self, now_ms: i64) -> i64 {
        if self.kind.has_embedded_occurrence_time() {
            if let Some(t) = self.payload.as_ref().and_then(occurrence_time_ms) {
                return t;
            }
        }
        self.timestamp.unwrap_or(now_ms)
    }

    /// Build the persisted event once the store has assigned an id and the
    /// timestamp has been resolved.
    pub fn into_event(self, id: i64, timestamp: i64) -> Event {
        Event {
            id,
            timestamp,
            session_id: self.session_id,
            kind: self.kind,
            source_app: self.source_app,
            model_name: self.model_name,
            tool_name: self.tool_name,
            payload: self.payload,
            summary: self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ingest(kind: &str) -> IngestEvent {
        IngestEvent {
            timestamp: None,
            session_id: "s1".to_string(),
            kind: EventKind::from(kind),
            source_app: None,
            model_name: None,
            tool_name: None,
            payload: None,
            summary: None,
        }
    }

    #[test]
    fn test_validate_rejects_blank_session_id() {
        let mut ev = ingest("PreToolUse");
        ev.session_id = "  ".to_string();
        assert!(ev.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_kind() {
        let mut ev = ingest("PreToolUse");
        ev.kind = EventKind::Other(String::new());
        assert!(ev.validate().is_err());
    }

    #[test]
    fn test_resolve_timestamp_defaults_to_clock() {
        let ev = ingest("PreToolUse");
        assert_eq!(ev.resolve_timestamp(12345), 12345);
    }

    #[test]
    fn test_resolve_timestamp_prefers_producer_field() {
        let mut ev = ingest("PreToolUse");
        ev.timestamp = Some(1000);
        assert_eq!(ev.resolve_timestamp(12345), 1000);
    }

    #[test]
    fn test_resolve_timestamp_prefers_embedded_occurrence_time() {
        let mut ev = ingest("TokenUsage");
        ev.timestamp = Some(99_999);
        ev.payload = Some(json!({
            "token_usage": {
                "timestamp": "1970-01-01T00:01:00.000Z",
                "input_tokens": 10
            }
        }));
        assert_eq!(ev.resolve_timestamp(12345), 60_000);
    }

    #[test]
    fn test_resolve_timestamp_falls_back_when_embedded_unparseable() {
        let mut ev = ingest("TokenUsage");
        ev.timestamp = Some(2000);
        ev.payload = Some(json!({ "token_usage": { "timestamp": "not-a-time" } }));
        assert_eq!(ev.resolve_timestamp(12345), 2000);
    }

    #[test]
    fn test_ingest_accepts_hook_event_type_alias() {
        let ev: IngestEvent = serde_json::from_value(json!({
            "session_id": "s1",
            "hook_event_type": "PreToolUse",
            "tool_name": "Read"
        }))
        .unwrap();
        assert_eq!(ev.kind, EventKind::PreToolUse);
        assert_eq!(ev.tool_name.as_deref(), Some("Read"));
    }
}
