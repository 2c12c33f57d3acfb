// Query API client
//
// Wraps the server's aggregation endpoints. Used at bootstrap (and after
// every reconnect) to rebuild the historical baseline, and by the
// periodic poll that refreshes aggregate views.

use anyhow::{Context, Result};
use serde::Deserialize;

use pulseboard_core::{ActiveSession, Event, SessionTokenBucket, TokenStats, ToolUsageStats};

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[allow(dead_code)]
    count: usize,
    events: Vec<Event>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<()> {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?
            .error_for_status()
            .context("server unhealthy")?;
        Ok(())
    }

    /// Most recent persisted events, newest first.
    pub async fn recent_events(
        &self,
        limit: i64,
        session_id: Option<&str>,
    ) -> Result<Vec<Event>> {
        let mut request = self
            .client
            .get(format!("{}/api/events", self.base_url))
            .query(&[("limit", limit)]);
        if let Some(session_id) = session_id {
            request = request.query(&[("session_id", session_id)]);
        }
        let response: EventsResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed events response")?;
        Ok(response.events)
    }

    pub async fn active_sessions(&self, minutes: i64) -> Result<Vec<ActiveSession>> {
        let sessions = self
            .client
            .get(format!("{}/api/sessions/active", self.base_url))
            .query(&[("minutes", minutes)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed sessions response")?;
        Ok(sessions)
    }

    pub async fn tool_stats(&self, hours: i64) -> Result<ToolUsageStats> {
        let stats = self
            .client
            .get(format!("{}/api/tools/stats", self.base_url))
            .query(&[("hours", hours)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed tool stats response")?;
        Ok(stats)
    }

    pub async fn token_stats(&self, hours: i64) -> Result<TokenStats> {
        let stats = self
            .client
            .get(format!("{}/api/tokens/stats", self.base_url))
            .query(&[("hours", hours)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed token stats response")?;
        Ok(stats)
    }

    pub async fn session_token_series(
        &self,
        hours: i64,
        session_id: Option<&str>,
    ) -> Result<Vec<SessionTokenBucket>> {
        let mut request = self
            .client
            .get(format!("{}/api/tokens/sessions", self.base_url))
            .query(&[("hours", hours)]);
        if let Some(session_id) = session_id {
            request = request.query(&[("session_id", session_id)]);
        }
        let series = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed token series response")?;
        Ok(series)
    }
}
