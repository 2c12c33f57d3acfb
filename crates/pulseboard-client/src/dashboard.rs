// Dashboard driver: bootstrap, live merge, aggregate polling, reconnect
//
// Connection lifecycle per the pipeline's recovery model: on every
// (re)connect the engine first re-fetches history, then resumes live
// merge. Local state is kept across disconnects; the id dedup makes the
// overlapping re-fetch idempotent. Aggregate views refresh on their own
// timer, independent of the stream: a stale poll response superseded by
// a newer one is just the earlier write to the same slot.

use anyhow::Result;
use chrono::Utc;
use futures::StreamExt;
use std::time::Duration;

use pulseboard_core::{ActiveSession, TokenStats, ToolUsageStats};

use crate::api::ApiClient;
use crate::live::{backoff_delay, LiveStream};
use crate::state::DashboardState;

/// How many recent events one bootstrap pulls.
const BOOTSTRAP_LIMIT: i64 = 1000;
/// Aggregate refresh cadence.
const POLL_INTERVAL_SECS: u64 = 10;

/// Latest aggregate views from the query API.
#[derive(Debug, Clone)]
pub struct AggregateSnapshot {
    pub active_sessions: Vec<ActiveSession>,
    pub tool_stats: ToolUsageStats,
    pub token_stats: TokenStats,
}

pub struct Dashboard {
    api: ApiClient,
    live: LiveStream,
    pub state: DashboardState,
    aggregates: Option<AggregateSnapshot>,
}

impl Dashboard {
    pub fn new(base_url: impl Into<String>, window_ms: i64) -> Self {
        let base_url = base_url.into();
        Self {
            api: ApiClient::new(base_url.clone()),
            live: LiveStream::new(base_url),
            state: DashboardState::new(window_ms, Utc::now().timestamp_millis()),
            aggregates: None,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn aggregates(&self) -> Option<&AggregateSnapshot> {
        self.aggregates.as_ref()
    }

    /// Fetch the historical baseline into state. Called before the first
    /// live merge and again after every reconnect (gap-fill).
    pub async fn bootstrap(&mut self) -> Result<usize> {
        let events = self.api.recent_events(BOOTSTRAP_LIMIT, None).await?;
        let added = self.state.apply_snapshot(events);
        tracing::debug!(added, total = self.state.len(), "bootstrap merged");
        Ok(added)
    }

    /// Change the selected window, then re-fetch history and aggregates
    /// for it.
    pub async fn set_window(&mut self, window_ms: i64) -> Result<()> {
        self.state.set_window(window_ms);
        self.bootstrap().await?;
        self.refresh_aggregates().await?;
        Ok(())
    }

    /// Pull the aggregate views for the current window.
    pub async fn refresh_aggregates(&mut self) -> Result<()> {
        let minutes = (self.state.window_ms() / 60_000).max(1);
        let snapshot = AggregateSnapshot {
            active_sessions: self.api.active_sessions(minutes).await?,
            tool_stats: self.api.tool_stats(1).await?,
            token_stats: self.api.token_stats(24).await?,
        };
        self.aggregates = Some(snapshot);
        Ok(())
    }

    /// Drive the dashboard forever: bootstrap, consume the live stream,
    /// tick once a second, poll aggregates on their own timer, and on any
    /// disconnect back off, re-bootstrap, and resume. `on_tick` fires
    /// after every clock tick with the current state and the latest
    /// aggregate snapshot.
    pub async fn run(
        &mut self,
        mut on_tick: impl FnMut(&DashboardState, Option<&AggregateSnapshot>),
    ) -> Result<()> {
        let mut attempt: u32 = 0;

        loop {
            // Re-bootstrap before every live merge so the gap missed while
            // offline is filled from durable history.
            match self.bootstrap().await {
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("bootstrap failed: {e:#}");
                    self.state.mark_disconnected();
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt = attempt.saturating_add(1);
                    continue;
                }
            }

            let mut stream = match self.live.connect().await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("live stream connect failed: {e:#}");
                    self.state.mark_disconnected();
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt = attempt.saturating_add(1);
                    continue;
                }
            };

            self.state.mark_connected();
            attempt = 0;
            tracing::info!("live stream connected");

            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            let mut poller = tokio::time::interval(Duration::from_secs(POLL_INTERVAL_SECS));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.state.tick(Utc::now().timestamp_millis());
                        on_tick(&self.state, self.aggregates.as_ref());
                    }
                    _ = poller.tick() => {
                        if let Err(e) = self.refresh_aggregates().await {
                            tracing::warn!("aggregate poll failed: {e:#}");
                        }
                    }
                    message = stream.next() => match message {
                        Some(Ok(event)) => {
                            self.state.apply_live(event);
                        }
                        Some(Err(e)) => {
                            tracing::warn!("live stream error: {e:#}");
                            break;
                        }
                        None => {
                            tracing::info!("live stream closed by server");
                            break;
                        }
                    }
                }
            }

            self.state.mark_disconnected();
            on_tick(&self.state, self.aggregates.as_ref());
            tokio::time::sleep(backoff_delay(attempt)).await;
            attempt = attempt.saturating_add(1);
        }
    }
}
