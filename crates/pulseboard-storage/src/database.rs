// Event store: connection handling, schema bootstrap, append and list

use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::{EventFilter, EventRow, NewEvent};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    session_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    source_app TEXT,
    model_name TEXT,
    tool_name TEXT,
    payload TEXT,
    summary TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

const INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_events_session_id ON events(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_events_kind ON events(kind)",
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `url` and bootstrap the
    /// schema. WAL keeps aggregate reads from blocking on the writer.
    pub async fn from_url(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let db = Self::new(pool);
        db.init_schema().await?;
        Ok(db)
    }

    /// In-memory database for tests. Single connection: each SQLite
    /// `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = Self::new(pool);
        db.init_schema().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the events table and its indexes if they do not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        for index in INDEXES {
            sqlx::query(index).execute(&self.pool).await?;
        }
        tracing::debug!("events schema ready");
        Ok(())
    }

    // ============================================
    // Events (append-only)
    // ============================================

    /// Append one event and return the stored row with its assigned id.
    pub async fn append(&self, input: NewEvent) -> Result<EventRow> {
        let payload_json = input
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (timestamp, session_id, kind, source_app, model_name, tool_name, payload, summary)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, timestamp, session_id, kind, source_app, model_name, tool_name, payload, summary, created_at
            "#,
        )
        .bind(input.timestamp)
        .bind(&input.session_id)
        .bind(&input.kind)
        .bind(&input.source_app)
        .bind(&input.model_name)
        .bind(&input.tool_name)
        .bind(&payload_json)
        .bind(&input.summary)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// List events matching the filter, newest first.
    pub async fn query(&self, filter: EventFilter) -> Result<Vec<EventRow>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, timestamp, session_id, kind, source_app, model_name, tool_name, payload, summary, created_at \
             FROM events WHERE 1=1",
        );

        if let Some(since) = filter.since {
            qb.push(" AND timestamp > ").push_bind(since);
        }
        if let Some(until) = filter.until {
            qb.push(" AND timestamp <= ").push_bind(until);
        }
        if let Some(session_id) = &filter.session_id {
            qb.push(" AND session_id = ").push_bind(session_id);
        }
        if let Some(kind) = &filter.kind {
            qb.push(" AND kind = ").push_bind(kind);
        }

        qb.push(" ORDER BY timestamp DESC, id DESC LIMIT ")
            .push_bind(filter.limit);

        let rows = qb.build_query_as::<EventRow>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_event(session_id: &str, kind: &str, timestamp: i64) -> NewEvent {
        NewEvent {
            timestamp,
            session_id: session_id.to_string(),
            kind: kind.to_string(),
            source_app: Some("proj".to_string()),
            model_name: None,
            tool_name: None,
            payload: None,
            summary: None,
        }
    }

    #[tokio::test]
    async fn test_append_assigns_fresh_increasing_ids() {
        let db = Database::in_memory().await.unwrap();

        let first = db.append(new_event("s1", "SessionStart", 1000)).await.unwrap();
        let second = db.append(new_event("s1", "PreToolUse", 2000)).await.unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_append_then_query_by_session_returns_event() {
        let db = Database::in_memory().await.unwrap();

        let mut input = new_event("s1", "PreToolUse", 1000);
        input.tool_name = Some("Read".to_string());
        input.payload = Some(json!({"tool_name": "Read"}));
        let appended = db.append(input).await.unwrap();

        let rows = db
            .query(EventFilter {
                session_id: Some("s1".to_string()),
                limit: 100,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, appended.id);
        let event = rows[0].clone().into_event();
        assert_eq!(event.tool_name.as_deref(), Some("Read"));
        assert_eq!(event.payload, Some(json!({"tool_name": "Read"})));
    }

    #[tokio::test]
    async fn test_query_orders_newest_first_and_respects_limit() {
        let db = Database::in_memory().await.unwrap();

        for ts in [1000, 3000, 2000] {
            db.append(new_event("s1", "Notification", ts)).await.unwrap();
        }

        let rows = db
            .query(EventFilter {
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, 3000);
        assert_eq!(rows[1].timestamp, 2000);
    }

    #[tokio::test]
    async fn test_query_filters_by_kind_and_window() {
        let db = Database::in_memory().await.unwrap();

        db.append(new_event("s1", "PreToolUse", 1000)).await.unwrap();
        db.append(new_event("s1", "PostToolUse", 2000)).await.unwrap();
        db.append(new_event("s2", "PostToolUse", 5000)).await.unwrap();

        let rows = db
            .query(EventFilter {
                kind: Some("PostToolUse".to_string()),
                since: Some(1500),
                until: Some(4000),
                limit: 100,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session_id, "s1");
        assert_eq!(rows[0].timestamp, 2000);
    }
}
