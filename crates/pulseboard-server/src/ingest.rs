// Event ingestion HTTP route
//
// Producers are session hooks running inside a latency-sensitive host
// process: they fire-and-forget and must never be blocked or crashed by
// this endpoint. The handler runs validate -> persist -> publish to
// completion without suspending on delivery, and responds as soon as the
// row is durable.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use pulseboard_core::IngestEvent;
use pulseboard_storage::{Database, NewEvent};

use crate::error::ApiError;
use crate::hub::BroadcastHub;

/// App state for the ingestion route
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub hub: BroadcastHub,
}

impl AppState {
    pub fn new(db: Arc<Database>, hub: BroadcastHub) -> Self {
        Self { db, hub }
    }
}

/// Create ingestion routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/events", post(ingest_event))
        .with_state(state)
}

/// Response for a successful ingest
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Store-assigned id of the persisted event.
    pub event_id: i64,
}

/// POST /events - Ingest one lifecycle event
///
/// Persists the event, then fans it out to connected live clients. A
/// persistence failure returns 500 and the event is NOT broadcast, so a
/// live viewer never sees an event with no durable record. Broadcast
/// itself cannot fail the request; zero connected clients is normal.
#[utoipa::path(
    post,
    path = "/events",
    request_body = IngestEvent,
    responses(
        (status = 200, description = "Event persisted and broadcast", body = IngestResponse),
        (status = 400, description = "Missing or malformed required fields"),
        (status = 500, description = "Persistence failure; event not broadcast")
    ),
    tag = "ingest"
)]
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(req): Json<IngestEvent>,
) -> Result<Json<IngestResponse>, ApiError> {
    req.validate()?;

    // Occurrence time, not receipt time: kinds that embed their own clock
    // (token usage) win over the producer field and the wall clock.
    let timestamp = req.resolve_timestamp(Utc::now().timestamp_millis());

    let row = state
        .db
        .append(NewEvent::from_ingest(req, timestamp))
        .await
        .map_err(|e| {
            tracing::error!("failed to persist event: {e}");
            ApiError::storage(e)
        })?;

    let event = row.into_event();
    let event_id = event.id;
    let receivers = state.hub.publish(event);
    tracing::debug!(event_id, receivers, "event ingested");

    Ok(Json(IngestResponse {
        status: "ok".to_string(),
        event_id,
    }))
}
