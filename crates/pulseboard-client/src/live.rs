// Live stream consumption
//
// One-way SSE from GET /stream. The server gives no replay: anything
// published while we were away is recovered by the caller re-bootstrapping
// from the query API, so this module only has to parse frames and report
// disconnects honestly.

use anyhow::{Context, Result};
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use std::time::Duration;

use pulseboard_core::Event;

const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_MAX_MS: u64 = 15_000;

/// Reconnect delay for the given attempt number (0-based): capped
/// exponential backoff.
pub fn backoff_delay(attempt: u32) -> Duration {
    let ms = BACKOFF_BASE_MS.saturating_mul(1u64 << attempt.min(10));
    Duration::from_millis(ms.min(BACKOFF_MAX_MS))
}

#[derive(Clone)]
pub struct LiveStream {
    client: reqwest::Client,
    base_url: String,
}

impl LiveStream {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Open the SSE connection and return a stream of parsed events.
    /// The stream ends (or yields Err) when the connection drops; the
    /// caller decides when to reconnect.
    pub async fn connect(&self) -> Result<impl Stream<Item = Result<Event>> + Unpin> {
        let response = self
            .client
            .get(format!("{}/stream", self.base_url))
            .send()
            .await
            .context("failed to open live stream")?
            .error_for_status()
            .context("live stream rejected")?;

        let stream = response.bytes_stream().eventsource().map(|message| {
            let message = message.context("live stream transport error")?;
            parse_stream_event(&message.data)
        });

        Ok(Box::pin(stream))
    }
}

/// Parse one SSE `data:` payload into an event.
pub fn parse_stream_event(data: &str) -> Result<Event> {
    serde_json::from_str(data).with_context(|| format!("malformed stream event: {data}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseboard_core::EventKind;

    #[test]
    fn test_backoff_grows_and_caps() {
        assert_eq!(backoff_delay(0), Duration::from_millis(500));
        assert_eq!(backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(6), Duration::from_millis(15_000));
        assert_eq!(backoff_delay(30), Duration::from_millis(15_000));
    }

    #[test]
    fn test_parse_stream_event_round_trips() {
        let json = r#"{
            "id": 7,
            "timestamp": 1000,
            "session_id": "s1",
            "kind": "PreToolUse",
            "source_app": null,
            "model_name": null,
            "tool_name": "Read",
            "payload": null,
            "summary": null
        }"#;

        let event = parse_stream_event(json).unwrap();
        assert_eq!(event.id, 7);
        assert_eq!(event.kind, EventKind::PreToolUse);

        assert!(parse_stream_event("not json").is_err());
    }
}
