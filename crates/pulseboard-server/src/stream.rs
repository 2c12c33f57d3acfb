// Live event stream HTTP route (SSE)
//
// One long-lived connection per dashboard client. Each connection owns a
// hub receiver and suspends only on "wait for next queued event": never
// on another client's I/O. Delivery is best-effort: a client that is
// disconnected (or dropped for lagging) recovers by re-bootstrapping from
// the query API, not by server-side replay.

use axum::{
    extract::State,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;

use crate::hub::BroadcastHub;

/// App state for the stream route
#[derive(Clone)]
pub struct AppState {
    pub hub: BroadcastHub,
}

impl AppState {
    pub fn new(hub: BroadcastHub) -> Self {
        Self { hub }
    }
}

/// Create stream routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/stream", get(stream_events))
        .with_state(state)
}

/// GET /stream - Push every newly ingested event to this client (SSE)
///
/// Each message carries the full persisted event as JSON in `data`, the
/// event kind in the SSE `event` field, and the store id in the SSE `id`
/// field. The connection stays open until either side closes it; a client
/// that falls behind the hub's buffer is closed so it re-bootstraps.
#[utoipa::path(
    get,
    path = "/stream",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream")
    ),
    tag = "stream"
)]
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.hub.subscribe();
    tracing::info!(
        subscribers = state.hub.subscriber_count(),
        "live stream client connected"
    );

    let stream = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(event) => {
                let json =
                    serde_json::to_string(event.as_ref()).unwrap_or_else(|_| "{}".to_string());
                let sse = SseEvent::default()
                    .event(event.kind.as_str())
                    .data(json)
                    .id(event.id.to_string());
                Some((Ok(sse), rx))
            }
            Err(RecvError::Lagged(missed)) => {
                // Slow consumer: close the connection instead of buffering
                // without bound; the client re-bootstraps on reconnect.
                tracing::warn!(missed, "live stream client lagged, closing");
                None
            }
            Err(RecvError::Closed) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pulseboard_core::{Event, EventKind};

    fn event(id: i64, kind: EventKind) -> Event {
        Event {
            id,
            timestamp: id * 1000,
            session_id: "s1".to_string(),
            kind,
            source_app: None,
            model_name: None,
            tool_name: None,
            payload: None,
            summary: None,
        }
    }

    #[tokio::test]
    async fn test_stream_pushes_published_events_as_sse_frames() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let hub = BroadcastHub::new();
        let app = routes(AppState::new(hub.clone()));

        let response = app
            .oneshot(Request::get("/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(hub.subscriber_count(), 1);

        // The handler has subscribed; events published now reach the body.
        hub.publish(event(41, EventKind::PreToolUse));
        hub.publish(event(42, EventKind::PostToolUse));

        let mut body = response.into_body().into_data_stream();
        let mut text = String::new();
        while !text.contains("\"id\":42") {
            let chunk = body.next().await.expect("stream ended early").unwrap();
            text.push_str(std::str::from_utf8(&chunk).unwrap());
        }

        let first = text.find("\"id\":41").unwrap();
        let second = text.find("\"id\":42").unwrap();
        assert!(first < second, "events must arrive in publish order");
        assert!(text.contains("event: PreToolUse"));
        assert!(text.contains("id: 41"));
    }

    #[tokio::test]
    async fn test_unfold_terminates_when_hub_closes() {
        let hub = BroadcastHub::new();
        let rx = hub.subscribe();

        let stream = stream::unfold(rx, |mut rx| async move {
            match rx.recv().await {
                Ok(event) => Some((event.id, rx)),
                Err(_) => None,
            }
        });

        hub.publish(event(1, EventKind::Notification));
        drop(hub);

        let ids: Vec<i64> = stream.collect().await;
        assert_eq!(ids, vec![1]);
    }
}
