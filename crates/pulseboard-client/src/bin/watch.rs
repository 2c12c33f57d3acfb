// Headless dashboard watcher
//
// Connects the reconstruction engine to a running pulseboard-server and
// prints one status line per second. Useful for eyeballing the pipeline
// without a browser. PULSEBOARD_URL and PULSEBOARD_WINDOW_MINUTES
// configure the target and the sliding window.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulseboard_client::Dashboard;

fn server_url() -> String {
    std::env::var("PULSEBOARD_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

fn window_minutes() -> i64 {
    std::env::var("PULSEBOARD_WINDOW_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(15)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulseboard_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url = server_url();
    let window_ms = window_minutes() * 60 * 1000;
    let mut dashboard = Dashboard::new(&base_url, window_ms);

    dashboard
        .api()
        .health()
        .await
        .context("is pulseboard-server running?")?;
    println!("watching {base_url} (window: {}m)", window_minutes());

    dashboard
        .run(|state, aggregates| {
            let sessions = state.sessions();
            let alerting = sessions.iter().filter(|s| s.alerting).count();
            let pairs = state.tool_pairs().len();
            let status = if state.is_connected() { "live" } else { "reconnecting" };
            let tokens = aggregates
                .map(|a| {
                    format!(
                        " | {}in/{}out tokens (24h)",
                        a.token_stats.totals.input_tokens, a.token_stats.totals.output_tokens
                    )
                })
                .unwrap_or_default();
            println!(
                "[{status}] {} events | {} sessions ({alerting} alerting) | {pairs} tool pairs{tokens}",
                state.len(),
                sessions.len(),
            );
            for group in state.groups() {
                for session in &group.sessions {
                    println!(
                        "  {} {} {} last={} events={}{}",
                        session.color,
                        group.source_app,
                        session.session_id,
                        session.last_event_kind,
                        session.event_count,
                        if session.alerting { " [ALERT]" } else { "" },
                    );
                }
            }
        })
        .await
}
