// Database models (internal, may differ from public DTOs)

use chrono::NaiveDateTime;
use pulseboard_core::{Event, EventKind};
use sqlx::FromRow;

// ============================================
// Event models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i64,
    pub timestamp: i64,
    pub session_id: String,
    pub kind: String,
    pub source_app: Option<String>,
    pub model_name: Option<String>,
    pub tool_name: Option<String>,
    /// JSON text as stored; parsed on the way out.
    pub payload: Option<String>,
    pub summary: Option<String>,
    pub created_at: NaiveDateTime,
}

impl EventRow {
    /// Convert the stored row into the wire-facing event entity.
    pub fn into_event(self) -> Event {
        let payload = self
            .payload
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok());
        Event {
            id: self.id,
            timestamp: self.timestamp,
            session_id: self.session_id,
            kind: EventKind::from(self.kind),
            source_app: self.source_app,
            model_name: self.model_name,
            tool_name: self.tool_name,
            payload,
            summary: self.summary,
        }
    }
}

/// Input for an append. The timestamp has already been resolved by the
/// ingestion layer (embedded occurrence time, producer field, or clock).
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub timestamp: i64,
    pub session_id: String,
    pub kind: String,
    pub source_app: Option<String>,
    pub model_name: Option<String>,
    pub tool_name: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub summary: Option<String>,
}

impl NewEvent {
    /// Build the append input from a validated ingest request.
    pub fn from_ingest(ingest: pulseboard_core::IngestEvent, timestamp: i64) -> Self {
        Self {
            timestamp,
            session_id: ingest.session_id,
            kind: ingest.kind.as_str().to_string(),
            source_app: ingest.source_app,
            model_name: ingest.model_name,
            tool_name: ingest.tool_name,
            payload: ingest.payload,
            summary: ingest.summary,
        }
    }
}

/// Optional filters for the event list query.
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Events with timestamp strictly greater than this, ms since epoch.
    pub since: Option<i64>,
    /// Events with timestamp less than or equal to this, ms since epoch.
    pub until: Option<i64>,
    pub session_id: Option<String>,
    pub kind: Option<String>,
    pub limit: i64,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            since: None,
            until: None,
            session_id: None,
            kind: None,
            limit: 100,
        }
    }
}

// ============================================
// Aggregate projection rows
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct SessionActivityRow {
    pub session_id: String,
    pub source_app: Option<String>,
    pub model_name: Option<String>,
    pub last_event_kind: String,
    pub last_activity: i64,
    pub event_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ToolCountRow {
    pub tool_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ToolOutcomeRow {
    pub success: i64,
    pub failure: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TokenBucketRow {
    pub bucket_start: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_creation_tokens: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TokenTotalsRow {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_creation_tokens: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionTokensRow {
    pub session_id: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_creation_tokens: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionTokenBucketRow {
    pub session_id: String,
    pub bucket_start: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
}
