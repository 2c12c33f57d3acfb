// Token usage payload types
//
// TokenUsage events carry per-API-call token counts extracted from the
// session transcript. The payload embeds the API call's own timestamp
// (RFC 3339), which is the authoritative occurrence time for bucketing.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-API-call token counts, as nested under `payload.token_usage`.
/// All counts default to 0 when absent: never null propagation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub model: String,
    /// RFC 3339 occurrence time of the API call.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub input_tokens: i64,
    #[serde(default)]
    pub output_tokens: i64,
    #[serde(default)]
    pub cache_creation_input_tokens: i64,
    #[serde(default)]
    pub cache_read_input_tokens: i64,
    #[serde(default)]
    pub cache_creation_1h_tokens: i64,
    #[serde(default)]
    pub cache_creation_5m_tokens: i64,
}

impl TokenUsage {
    /// Parse the `token_usage` object out of an event payload.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let usage = payload.get("token_usage")?;
        serde_json::from_value(usage.clone()).ok()
    }
}

/// Extract the embedded occurrence time from a TokenUsage payload, in
/// milliseconds since epoch. Returns None when the field is missing or
/// not valid RFC 3339.
pub fn occurrence_time_ms(payload: &Value) -> Option<i64> {
    let raw = payload
        .get("token_usage")
        .and_then(|u| u.get("timestamp"))
        .and_then(|t| t.as_str())?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}
