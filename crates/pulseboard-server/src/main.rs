// Pulseboard API server
// Decision: single process; ingestion, fan-out, and queries share one SQLite store
// Decision: persistence and broadcast are independent steps; broadcast never fails a request

mod config;
mod error;
mod hub;
mod ingest;
mod queries;
mod stream;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pulseboard_storage::Database;

use crate::config::ServerConfig;
use crate::hub::BroadcastHub;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        ingest::ingest_event,
        stream::stream_events,
        queries::list_events,
        queries::active_sessions,
        queries::tool_stats,
        queries::token_stats,
        queries::token_sessions,
    ),
    components(
        schemas(
            pulseboard_core::Event,
            pulseboard_core::IngestEvent,
            pulseboard_core::ActiveSession,
            pulseboard_core::ToolCount,
            pulseboard_core::ToolOutcomes,
            pulseboard_core::ToolUsageStats,
            pulseboard_core::TokenBucket,
            pulseboard_core::TokenTotals,
            pulseboard_core::SessionTokens,
            pulseboard_core::TokenStats,
            pulseboard_core::SessionTokenBucket,
            ingest::IngestResponse,
            queries::EventsResponse,
        )
    ),
    tags(
        (name = "ingest", description = "Event ingestion endpoint"),
        (name = "stream", description = "Live event stream (SSE)"),
        (name = "queries", description = "Aggregate query endpoints")
    ),
    info(
        title = "Pulseboard API",
        version = "0.2.0",
        description = "Event telemetry pipeline for agent-session observability",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulseboard_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("pulseboard-server starting...");

    let config = ServerConfig::from_env();

    // Initialize database (creates the file and schema on first run)
    let db = Database::from_url(&config.database_url())
        .await
        .context("Failed to open database")?;
    tracing::info!(url = %config.database_url(), "Database ready");

    let db = Arc::new(db);
    let hub = BroadcastHub::new();

    // Create module-specific states
    let ingest_state = ingest::AppState::new(db.clone(), hub.clone());
    let stream_state = stream::AppState::new(hub.clone());
    let queries_state = queries::AppState::new(db.clone());

    // Load CORS allowed origins from environment (optional)
    // Only needed when the dashboard is served from a different origin
    // Example: CORS_ALLOWED_ORIGINS="http://localhost:5173"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    let app = build_router(ingest_state, stream_state, queries_state);

    // Add Swagger UI
    let app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::CACHE_CONTROL,
                ]),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build the application router (extracted for testing)
fn build_router(
    ingest_state: ingest::AppState,
    stream_state: stream::AppState,
    queries_state: queries::AppState,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(ingest::routes(ingest_state))
        .merge(stream::routes(stream_state))
        .merge(queries::routes(queries_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let hub = BroadcastHub::new();
        build_router(
            ingest::AppState::new(db.clone(), hub.clone()),
            stream::AppState::new(hub),
            queries::AppState::new(db),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ingested_event_is_visible_to_queries() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::post("/events")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "session_id": "s1",
                            "kind": "SessionStart",
                            "timestamp": chrono::Utc::now().timestamp_millis()
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let response = app
            .oneshot(
                Request::get("/api/events?session_id=s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["count"], 1);
    }
}
