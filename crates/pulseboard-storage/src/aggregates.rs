// Aggregate queries over the events table
//
// All projections here are computed from the base table at query time.
// Token sums read numeric fields out of the stored payload JSON with
// json_extract; absent fields count as 0, and buckets with no rows are
// simply not returned (sparse series).

use anyhow::Result;
use sqlx::QueryBuilder;

use crate::database::Database;
use crate::models::{
    SessionActivityRow, SessionTokenBucketRow, SessionTokensRow, TokenBucketRow, TokenTotalsRow,
    ToolCountRow, ToolOutcomeRow,
};

/// Shared SUM list for token aggregates. CAST keeps the sums INTEGER even
/// if a producer sent a numeric field as a JSON string.
const TOKEN_SUMS: &str = "\
COALESCE(SUM(CAST(COALESCE(json_extract(payload, '$.token_usage.input_tokens'), 0) AS INTEGER)), 0) AS input_tokens, \
COALESCE(SUM(CAST(COALESCE(json_extract(payload, '$.token_usage.output_tokens'), 0) AS INTEGER)), 0) AS output_tokens, \
COALESCE(SUM(CAST(COALESCE(json_extract(payload, '$.token_usage.cache_read_input_tokens'), 0) AS INTEGER)), 0) AS cache_read_tokens, \
COALESCE(SUM(CAST(COALESCE(json_extract(payload, '$.token_usage.cache_creation_input_tokens'), 0) AS INTEGER)), 0) AS cache_creation_tokens";

impl Database {
    // ============================================
    // Active sessions
    // ============================================

    /// Sessions with any event after `since_ms`, most recently active
    /// first. The kind/source_app/model_name come from the session's most
    /// recent event within the window.
    pub async fn aggregate_by_session(&self, since_ms: i64) -> Result<Vec<SessionActivityRow>> {
        let rows = sqlx::query_as::<_, SessionActivityRow>(
            r#"
            SELECT
                e.session_id,
                (SELECT source_app FROM events
                 WHERE session_id = e.session_id AND timestamp > ?
                 ORDER BY timestamp DESC, id DESC LIMIT 1) AS source_app,
                (SELECT model_name FROM events
                 WHERE session_id = e.session_id AND timestamp > ?
                 ORDER BY timestamp DESC, id DESC LIMIT 1) AS model_name,
                (SELECT kind FROM events
                 WHERE session_id = e.session_id AND timestamp > ?
                 ORDER BY timestamp DESC, id DESC LIMIT 1) AS last_event_kind,
                MAX(e.timestamp) AS last_activity,
                COUNT(*) AS event_count
            FROM events e
            WHERE e.timestamp > ?
            GROUP BY e.session_id
            ORDER BY last_activity DESC
            "#,
        )
        .bind(since_ms)
        .bind(since_ms)
        .bind(since_ms)
        .bind(since_ms)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    // ============================================
    // Tool usage
    // ============================================

    /// Per-tool invocation counts (descending) and the success/failure
    /// tally over tool completion events.
    pub async fn aggregate_tool_usage(
        &self,
        since_ms: i64,
    ) -> Result<(Vec<ToolCountRow>, ToolOutcomeRow)> {
        let counts = sqlx::query_as::<_, ToolCountRow>(
            r#"
            SELECT tool_name, COUNT(*) AS count
            FROM events
            WHERE timestamp > ? AND tool_name IS NOT NULL
            GROUP BY tool_name
            ORDER BY count DESC
            "#,
        )
        .bind(since_ms)
        .fetch_all(self.pool())
        .await?;

        let outcomes = sqlx::query_as::<_, ToolOutcomeRow>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'PostToolUse' THEN 1 ELSE 0 END), 0) AS success,
                COALESCE(SUM(CASE WHEN kind = 'PostToolUseFailure' THEN 1 ELSE 0 END), 0) AS failure
            FROM events
            WHERE timestamp > ? AND kind IN ('PostToolUse', 'PostToolUseFailure')
            "#,
        )
        .bind(since_ms)
        .fetch_one(self.pool())
        .await?;

        Ok((counts, outcomes))
    }

    // ============================================
    // Token series
    // ============================================

    /// Global token sums in fixed buckets of `bucket_ms`, ascending by
    /// bucket start. Empty buckets are omitted.
    pub async fn aggregate_token_series(
        &self,
        since_ms: i64,
        bucket_ms: i64,
    ) -> Result<Vec<TokenBucketRow>> {
        let sql = format!(
            "SELECT (timestamp / ?) * ? AS bucket_start, {TOKEN_SUMS} \
             FROM events \
             WHERE kind = 'TokenUsage' AND timestamp > ? \
             GROUP BY bucket_start \
             ORDER BY bucket_start ASC"
        );

        let rows = sqlx::query_as::<_, TokenBucketRow>(&sql)
            .bind(bucket_ms)
            .bind(bucket_ms)
            .bind(since_ms)
            .fetch_all(self.pool())
            .await?;

        Ok(rows)
    }

    /// Per-session token sums in fixed buckets of `bucket_ms`, optionally
    /// restricted to a single session.
    pub async fn aggregate_session_token_series(
        &self,
        since_ms: i64,
        bucket_ms: i64,
        session_id: Option<&str>,
    ) -> Result<Vec<SessionTokenBucketRow>> {
        let mut qb: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("SELECT session_id, (timestamp / ");
        qb.push_bind(bucket_ms)
            .push(") * ")
            .push_bind(bucket_ms)
            .push(" AS bucket_start, ")
            .push(TOKEN_SUMS)
            .push(" FROM events WHERE kind = 'TokenUsage' AND timestamp > ")
            .push_bind(since_ms);
        if let Some(session_id) = session_id {
            qb.push(" AND session_id = ").push_bind(session_id);
        }
        qb.push(" GROUP BY session_id, bucket_start ORDER BY session_id ASC, bucket_start ASC");

        let rows = qb
            .build_query_as::<SessionTokenBucketRow>()
            .fetch_all(self.pool())
            .await?;

        Ok(rows)
    }

    /// Window-wide token totals.
    pub async fn aggregate_token_totals(&self, since_ms: i64) -> Result<TokenTotalsRow> {
        let sql = format!(
            "SELECT {TOKEN_SUMS} FROM events WHERE kind = 'TokenUsage' AND timestamp > ?"
        );

        let row = sqlx::query_as::<_, TokenTotalsRow>(&sql)
            .bind(since_ms)
            .fetch_one(self.pool())
            .await?;

        Ok(row)
    }

    /// Heaviest sessions by total token consumption, descending, top `limit`.
    pub async fn aggregate_tokens_by_session(
        &self,
        since_ms: i64,
        limit: i64,
    ) -> Result<Vec<SessionTokensRow>> {
        let sql = format!(
            "SELECT * FROM ( \
                 SELECT session_id, {TOKEN_SUMS} \
                 FROM events \
                 WHERE kind = 'TokenUsage' AND timestamp > ? \
                 GROUP BY session_id \
             ) \
             ORDER BY (input_tokens + output_tokens + cache_read_tokens + cache_creation_tokens) DESC \
             LIMIT ?"
        );

        let rows = sqlx::query_as::<_, SessionTokensRow>(&sql)
            .bind(since_ms)
            .bind(limit)
            .fetch_all(self.pool())
            .await?;

        Ok(rows)
    }
}
