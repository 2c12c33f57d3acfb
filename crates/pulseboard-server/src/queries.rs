// Aggregation query HTTP routes
//
// All windows are half-open: (now - window, now]. Every projection is
// computed from the events table at query time; responses may include or
// exclude an event ingested concurrently (no snapshot consistency).

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use pulseboard_core::{
    ActiveSession, Event, EventKind, SessionTokenBucket, SessionTokens, TokenBucket, TokenStats,
    TokenTotals, ToolCount, ToolOutcomes, ToolUsageStats,
};
use pulseboard_storage::{Database, EventFilter};

use crate::error::ApiError;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;
const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const TOP_SESSIONS: i64 = 10;

/// App state for query routes
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

/// Create query routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/events", get(list_events))
        .route("/api/sessions/active", get(active_sessions))
        .route("/api/tools/stats", get(tool_stats))
        .route("/api/tokens/stats", get(token_stats))
        .route("/api/tokens/sessions", get(token_sessions))
        .with_state(state)
}

// ============================================
// Query parameters
// ============================================

/// Query parameters for the events list
#[derive(Debug, Deserialize, IntoParams)]
pub struct EventsQuery {
    /// Maximum number of events to return. Defaults to 100, capped at 1000.
    pub limit: Option<i64>,
    pub session_id: Option<String>,
    /// Filter to one event kind (wire name, e.g. "PreToolUse").
    pub event_type: Option<String>,
}

/// Query parameters for active sessions
#[derive(Debug, Deserialize, IntoParams)]
pub struct MinutesQuery {
    /// Recency window in minutes. Defaults to 60.
    pub minutes: Option<i64>,
}

/// Query parameters for tool stats
#[derive(Debug, Deserialize, IntoParams)]
pub struct HoursQuery {
    /// Time window in hours. Defaults to 1.
    pub hours: Option<i64>,
}

/// Query parameters for token overview stats
#[derive(Debug, Deserialize, IntoParams)]
pub struct TokenStatsQuery {
    /// Time window in hours. Defaults to 24.
    pub hours: Option<i64>,
}

/// Query parameters for per-session token series
#[derive(Debug, Deserialize, IntoParams)]
pub struct TokenSessionsQuery {
    /// Time window in hours. Defaults to 1.
    pub hours: Option<i64>,
    /// Restrict the series to one session.
    pub session_id: Option<String>,
}

fn window_start(now_ms: i64, amount: i64, unit_ms: i64, label: &str) -> Result<i64, ApiError> {
    if amount <= 0 {
        return Err(ApiError::query(format!("{label} must be positive, got {amount}")));
    }
    Ok(now_ms - amount * unit_ms)
}

// ============================================
// HTTP handlers
// ============================================

/// Response for the events list
#[derive(Debug, Serialize, ToSchema)]
pub struct EventsResponse {
    /// Number of events returned.
    pub count: usize,
    /// Matching events, newest first.
    pub events: Vec<Event>,
}

/// GET /api/events - Most recent persisted events, with optional filters
#[utoipa::path(
    get,
    path = "/api/events",
    params(EventsQuery),
    responses(
        (status = 200, description = "Events list, newest first", body = EventsResponse),
        (status = 400, description = "Malformed filter parameters"),
        (status = 500, description = "Internal server error")
    ),
    tag = "queries"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if limit <= 0 {
        return Err(ApiError::query(format!("limit must be positive, got {limit}")));
    }

    let rows = state
        .db
        .query(EventFilter {
            session_id: query.session_id,
            kind: query.event_type,
            limit: limit.min(MAX_LIMIT),
            ..Default::default()
        })
        .await
        .map_err(|e| {
            tracing::error!("failed to list events: {e}");
            ApiError::storage(e)
        })?;

    let events: Vec<Event> = rows.into_iter().map(|row| row.into_event()).collect();
    Ok(Json(EventsResponse {
        count: events.len(),
        events,
    }))
}

/// GET /api/sessions/active - Sessions with activity in the last N minutes
#[utoipa::path(
    get,
    path = "/api/sessions/active",
    params(MinutesQuery),
    responses(
        (status = 200, description = "Active sessions, most recent first", body = [ActiveSession]),
        (status = 400, description = "Malformed time window"),
        (status = 500, description = "Internal server error")
    ),
    tag = "queries"
)]
pub async fn active_sessions(
    State(state): State<AppState>,
    Query(query): Query<MinutesQuery>,
) -> Result<Json<Vec<ActiveSession>>, ApiError> {
    let now_ms = Utc::now().timestamp_millis();
    let since = window_start(now_ms, query.minutes.unwrap_or(60), MINUTE_MS, "minutes")?;

    let rows = state.db.aggregate_by_session(since).await.map_err(|e| {
        tracing::error!("failed to aggregate sessions: {e}");
        ApiError::storage(e)
    })?;

    let sessions = rows
        .into_iter()
        .map(|row| ActiveSession {
            session_id: row.session_id,
            source_app: row.source_app,
            model_name: row.model_name,
            last_event_kind: EventKind::from(row.last_event_kind),
            last_activity: row.last_activity,
            event_count: row.event_count,
        })
        .collect();

    Ok(Json(sessions))
}

/// GET /api/tools/stats - Tool usage counts and success/failure tally
#[utoipa::path(
    get,
    path = "/api/tools/stats",
    params(HoursQuery),
    responses(
        (status = 200, description = "Tool usage statistics", body = ToolUsageStats),
        (status = 400, description = "Malformed time window"),
        (status = 500, description = "Internal server error")
    ),
    tag = "queries"
)]
pub async fn tool_stats(
    State(state): State<AppState>,
    Query(query): Query<HoursQuery>,
) -> Result<Json<ToolUsageStats>, ApiError> {
    let now_ms = Utc::now().timestamp_millis();
    let since = window_start(now_ms, query.hours.unwrap_or(1), HOUR_MS, "hours")?;

    let (counts, outcomes) = state.db.aggregate_tool_usage(since).await.map_err(|e| {
        tracing::error!("failed to aggregate tool usage: {e}");
        ApiError::storage(e)
    })?;

    Ok(Json(ToolUsageStats {
        tool_usage: counts
            .into_iter()
            .map(|row| ToolCount {
                tool_name: row.tool_name,
                count: row.count,
            })
            .collect(),
        success_failure: ToolOutcomes {
            success: outcomes.success,
            failure: outcomes.failure,
        },
    }))
}

/// GET /api/tokens/stats - Window totals, heaviest sessions, hourly series
#[utoipa::path(
    get,
    path = "/api/tokens/stats",
    params(TokenStatsQuery),
    responses(
        (status = 200, description = "Token consumption overview", body = TokenStats),
        (status = 400, description = "Malformed time window"),
        (status = 500, description = "Internal server error")
    ),
    tag = "queries"
)]
pub async fn token_stats(
    State(state): State<AppState>,
    Query(query): Query<TokenStatsQuery>,
) -> Result<Json<TokenStats>, ApiError> {
    let now_ms = Utc::now().timestamp_millis();
    let since = window_start(now_ms, query.hours.unwrap_or(24), HOUR_MS, "hours")?;

    let totals = state.db.aggregate_token_totals(since).await.map_err(|e| {
        tracing::error!("failed to aggregate token totals: {e}");
        ApiError::storage(e)
    })?;
    let by_session = state
        .db
        .aggregate_tokens_by_session(since, TOP_SESSIONS)
        .await
        .map_err(|e| {
            tracing::error!("failed to aggregate tokens by session: {e}");
            ApiError::storage(e)
        })?;
    let hourly = state
        .db
        .aggregate_token_series(since, HOUR_MS)
        .await
        .map_err(|e| {
            tracing::error!("failed to aggregate token series: {e}");
            ApiError::storage(e)
        })?;

    Ok(Json(TokenStats {
        totals: TokenTotals {
            input_tokens: totals.input_tokens,
            output_tokens: totals.output_tokens,
            cache_read_tokens: totals.cache_read_tokens,
            cache_creation_tokens: totals.cache_creation_tokens,
        },
        by_session: by_session
            .into_iter()
            .map(|row| SessionTokens {
                session_id: row.session_id,
                input_tokens: row.input_tokens,
                output_tokens: row.output_tokens,
                cache_read_tokens: row.cache_read_tokens,
                cache_creation_tokens: row.cache_creation_tokens,
            })
            .collect(),
        hourly: hourly
            .into_iter()
            .map(|row| TokenBucket {
                bucket_start: row.bucket_start,
                input_tokens: row.input_tokens,
                output_tokens: row.output_tokens,
                cache_read_tokens: row.cache_read_tokens,
                cache_creation_tokens: row.cache_creation_tokens,
            })
            .collect(),
    }))
}

/// GET /api/tokens/sessions - Minute-bucketed per-session token series
#[utoipa::path(
    get,
    path = "/api/tokens/sessions",
    params(TokenSessionsQuery),
    responses(
        (status = 200, description = "Sparse per-session minute series", body = [SessionTokenBucket]),
        (status = 400, description = "Malformed time window"),
        (status = 500, description = "Internal server error")
    ),
    tag = "queries"
)]
pub async fn token_sessions(
    State(state): State<AppState>,
    Query(query): Query<TokenSessionsQuery>,
) -> Result<Json<Vec<SessionTokenBucket>>, ApiError> {
    let now_ms = Utc::now().timestamp_millis();
    let since = window_start(now_ms, query.hours.unwrap_or(1), HOUR_MS, "hours")?;

    let rows = state
        .db
        .aggregate_session_token_series(since, MINUTE_MS, query.session_id.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("failed to aggregate session token series: {e}");
            ApiError::storage(e)
        })?;

    let series = rows
        .into_iter()
        .map(|row| SessionTokenBucket {
            session_id: row.session_id,
            bucket_start: row.bucket_start,
            input_tokens: row.input_tokens,
            output_tokens: row.output_tokens,
            cache_read_tokens: row.cache_read_tokens,
        })
        .collect();

    Ok(Json(series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use pulseboard_storage::NewEvent;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn seeded_state() -> AppState {
        let db = Arc::new(Database::in_memory().await.unwrap());
        AppState::new(db)
    }

    async fn append(
        state: &AppState,
        session_id: &str,
        kind: &str,
        timestamp: i64,
        tool_name: Option<&str>,
        payload: Option<Value>,
    ) {
        state
            .db
            .append(NewEvent {
                timestamp,
                session_id: session_id.to_string(),
                kind: kind.to_string(),
                source_app: Some("proj".to_string()),
                model_name: None,
                tool_name: tool_name.map(str::to_string),
                payload,
                summary: None,
            })
            .await
            .unwrap();
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, parsed)
    }

    #[tokio::test]
    async fn test_list_events_newest_first_with_count() {
        let state = seeded_state().await;
        append(&state, "s1", "SessionStart", 1000, None, None).await;
        append(&state, "s1", "PreToolUse", 2000, Some("Read"), None).await;
        append(&state, "s2", "SessionStart", 3000, None, None).await;

        let (status, body) = get_json(routes(state.clone()), "/api/events?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["events"][0]["session_id"], "s2");

        let (status, body) =
            get_json(routes(state), "/api/events?session_id=s1&event_type=PreToolUse").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["events"][0]["tool_name"], "Read");
    }

    #[tokio::test]
    async fn test_list_events_rejects_bad_limit() {
        let state = seeded_state().await;
        let (status, _) = get_json(routes(state), "/api/events?limit=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_active_sessions_window_and_validation() {
        let state = seeded_state().await;
        let now_ms = Utc::now().timestamp_millis();
        append(&state, "fresh", "PreToolUse", now_ms - 10_000, None, None).await;
        append(&state, "stale", "SessionStart", now_ms - 2 * 3_600_000, None, None).await;

        let (status, body) = get_json(routes(state.clone()), "/api/sessions/active?minutes=60").await;
        assert_eq!(status, StatusCode::OK);
        let sessions = body.as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["session_id"], "fresh");
        assert_eq!(sessions[0]["last_event_kind"], "PreToolUse");

        let (status, _) = get_json(routes(state.clone()), "/api/sessions/active?minutes=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(routes(state), "/api/sessions/active?minutes=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tool_stats_reports_paired_success() {
        let state = seeded_state().await;
        let now_ms = Utc::now().timestamp_millis();
        append(&state, "s1", "PreToolUse", now_ms - 2000, Some("Read"), None).await;
        append(&state, "s1", "PostToolUse", now_ms - 1500, Some("Read"), None).await;

        let (status, body) = get_json(routes(state), "/api/tools/stats?hours=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success_failure"]["success"], 1);
        assert_eq!(body["success_failure"]["failure"], 0);
        assert_eq!(body["tool_usage"][0]["tool_name"], "Read");
        assert_eq!(body["tool_usage"][0]["count"], 2);
    }

    #[tokio::test]
    async fn test_token_stats_shape() {
        let state = seeded_state().await;
        let now_ms = Utc::now().timestamp_millis();
        append(
            &state,
            "s1",
            "TokenUsage",
            now_ms - 1000,
            None,
            Some(json!({"token_usage": {"input_tokens": 100, "output_tokens": 5}})),
        )
        .await;

        let (status, body) = get_json(routes(state), "/api/tokens/stats?hours=24").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["input_tokens"], 100);
        assert_eq!(body["by_session"][0]["session_id"], "s1");
        assert_eq!(body["hourly"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_token_sessions_minute_series_scoped_to_session() {
        let state = seeded_state().await;
        let now_ms = Utc::now().timestamp_millis();
        let usage = |input: i64| json!({"token_usage": {"input_tokens": input}});
        append(&state, "s1", "TokenUsage", now_ms - 90_000, None, Some(usage(10))).await;
        append(&state, "s1", "TokenUsage", now_ms - 30_000, None, Some(usage(5))).await;
        append(&state, "s2", "TokenUsage", now_ms - 30_000, None, Some(usage(7))).await;

        let (status, body) =
            get_json(routes(state.clone()), "/api/tokens/sessions?hours=1&session_id=s1").await;
        assert_eq!(status, StatusCode::OK);
        let series = body.as_array().unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|p| p["session_id"] == "s1"));

        let (status, body) = get_json(routes(state), "/api/tokens/sessions?hours=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }
}
