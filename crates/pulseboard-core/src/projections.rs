// Read-time projections
//
// None of these types are stored. They are computed from the events table
// at query time and returned by the aggregation API; the client engine
// also consumes them during bootstrap.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::kind::EventKind;

/// One session with activity inside the requested recency window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ActiveSession {
    pub session_id: String,
    pub source_app: Option<String>,
    pub model_name: Option<String>,
    /// Kind of the session's most recent event.
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub last_event_kind: EventKind,
    /// Max event timestamp within the window, ms since epoch.
    pub last_activity: i64,
    pub event_count: i64,
}

/// Invocation count for one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ToolCount {
    pub tool_name: String,
    pub count: i64,
}

/// Success/failure tally over tool completion events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ToolOutcomes {
    pub success: i64,
    pub failure: i64,
}

/// Tool usage over a time window: per-tool counts (descending) plus the
/// overall completion outcome tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ToolUsageStats {
    pub tool_usage: Vec<ToolCount>,
    pub success_failure: ToolOutcomes,
}

/// Token sums for one fixed-width time bucket. Buckets with no events are
/// omitted from every series: a gap means "no data", not zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TokenBucket {
    /// Bucket start, ms since epoch, truncated to the bucket width.
    pub bucket_start: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_creation_tokens: i64,
}

/// Window-wide token sums.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TokenTotals {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_creation_tokens: i64,
}

/// Token sums for one session within the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SessionTokens {
    pub session_id: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_creation_tokens: i64,
}

/// Overview token statistics: window totals, heaviest sessions, and the
/// hour-bucketed series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TokenStats {
    pub totals: TokenTotals,
    pub by_session: Vec<SessionTokens>,
    pub hourly: Vec<TokenBucket>,
}

/// One minute-bucketed point of a per-session token series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SessionTokenBucket {
    pub session_id: String,
    pub bucket_start: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
}
