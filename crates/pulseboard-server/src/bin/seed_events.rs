// Synthetic event generator
//
// Drives a running pulseboard-server the way real session hooks would:
// realistic per-session event sequences (prompt, tool pre/post pairs with
// a 90% success rate, occasional permission requests and subagent spans,
// token-usage batches, session end), posted with small randomized delays.
//
// Usage: start the server, then `cargo run --bin seed-events`.
// PULSEBOARD_URL overrides the default http://localhost:8000.

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use rand::prelude::*;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

const NUM_SESSIONS: usize = 3;

fn server_url() -> String {
    std::env::var("PULSEBOARD_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

fn short_hex(len: usize) -> String {
    Uuid::new_v4().simple().to_string()[..len].to_string()
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn base_event(session_id: &str, kind: &str, model_name: &str) -> Value {
    json!({
        "timestamp": now_ms(),
        "session_id": session_id,
        "kind": kind,
        "source_app": "seed-events",
        "model_name": model_name,
        "payload": {
            "session_id": session_id,
            "kind": kind,
        }
    })
}

fn with_extra(mut event: Value, extra: Value) -> Value {
    if let (Some(obj), Some(extra)) = (event.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            if key == "payload_extra" {
                if let (Some(payload), Some(extra_fields)) = (
                    obj.get_mut("payload").and_then(Value::as_object_mut),
                    value.as_object(),
                ) {
                    for (k, v) in extra_fields {
                        payload.insert(k.clone(), v.clone());
                    }
                }
            } else {
                obj.insert(key.clone(), value.clone());
            }
        }
    }
    event
}

/// Generate a realistic sequence of events for one session.
fn generate_session_events(rng: &mut ThreadRng, session_id: &str) -> Vec<Value> {
    let model = ["claude-opus-4-6", "claude-sonnet-4-5", "claude-haiku-4-5"]
        .choose(rng)
        .unwrap()
        .to_string();
    let mut events = Vec::new();

    events.push(with_extra(
        base_event(session_id, "SessionStart", &model),
        json!({ "payload_extra": { "source": "terminal" } }),
    ));

    events.push(with_extra(
        base_event(session_id, "UserPromptSubmit", &model),
        json!({
            "summary": "User asked to analyze a source file",
            "payload_extra": { "prompt": "Can you analyze this file and suggest improvements?" }
        }),
    ));

    // Tool usage sequence
    let tools = [
        ("Read", "Reading project file"),
        ("Grep", "Searching for patterns"),
        ("Edit", "Modifying code"),
        ("Bash", "Running tests"),
        ("Write", "Creating new file"),
    ];
    let picks: usize = rng.gen_range(2..=4);
    for (tool_name, summary) in tools.choose_multiple(rng, picks).copied() {
        let tool_use_id = format!("tool_use_{}", short_hex(12));

        events.push(with_extra(
            base_event(session_id, "PreToolUse", &model),
            json!({
                "tool_name": tool_name,
                "summary": summary,
                "payload_extra": { "tool_name": tool_name, "tool_use_id": tool_use_id }
            }),
        ));

        // 90% success rate
        if rng.gen_bool(0.9) {
            events.push(with_extra(
                base_event(session_id, "PostToolUse", &model),
                json!({
                    "tool_name": tool_name,
                    "payload_extra": {
                        "tool_name": tool_name,
                        "tool_use_id": tool_use_id,
                        "result": "Tool execution successful"
                    }
                }),
            ));
        } else {
            events.push(with_extra(
                base_event(session_id, "PostToolUseFailure", &model),
                json!({
                    "tool_name": tool_name,
                    "payload_extra": {
                        "tool_name": tool_name,
                        "tool_use_id": tool_use_id,
                        "error": format!("Failed to execute {tool_name}: Permission denied")
                    }
                }),
            ));
        }
    }

    if rng.gen_bool(0.2) {
        events.push(with_extra(
            base_event(session_id, "PermissionRequest", &model),
            json!({
                "tool_name": "Bash",
                "payload_extra": { "tool_name": "Bash", "suggestions": ["allow", "deny"] }
            }),
        ));
    }

    if rng.gen_bool(0.3) {
        let agent_id = format!("agent_{}", short_hex(8));
        events.push(with_extra(
            base_event(session_id, "SubagentStart", &model),
            json!({ "payload_extra": { "agent_id": agent_id, "agent_type": "code-reviewer" } }),
        ));
        events.push(with_extra(
            base_event(session_id, "SubagentStop", &model),
            json!({ "payload_extra": { "agent_id": agent_id, "agent_type": "code-reviewer" } }),
        ));
    }

    if rng.gen_bool(0.1) {
        events.push(with_extra(
            base_event(session_id, "Notification", &model),
            json!({
                "summary": "Task completed successfully",
                "payload_extra": { "message": "All tests passed" }
            }),
        ));
    }

    // Token usage batches, simulating per-API-call tracking
    let batches: usize = rng.gen_range(2..=4);
    for _ in 0..batches {
        let cache_create: i64 = rng.gen_range(0..5_000);
        let input_tokens: i64 = rng.gen_range(2_000..80_000);
        let output_tokens: i64 = rng.gen_range(200..4_000);
        let cache_read: i64 = rng.gen_range(0..60_000);
        events.push(with_extra(
            base_event(session_id, "TokenUsage", &model),
            json!({
                "payload_extra": {
                    "token_usage": {
                        "request_id": format!("req_{}", short_hex(24)),
                        "model": model,
                        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                        "input_tokens": input_tokens,
                        "output_tokens": output_tokens,
                        "cache_creation_input_tokens": cache_create,
                        "cache_read_input_tokens": cache_read,
                        "cache_creation_1h_tokens": cache_create,
                        "cache_creation_5m_tokens": 0,
                    }
                }
            }),
        ));
    }

    // 80% chance of a normal completion
    if rng.gen_bool(0.8) {
        events.push(with_extra(
            base_event(session_id, "SessionEnd", &model),
            json!({ "payload_extra": { "reason": "user_exit" } }),
        ));
    }

    events
}

async fn check_health(client: &reqwest::Client, base_url: &str) -> Result<()> {
    let response = client
        .get(format!("{base_url}/health"))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .context("server health check failed")?;
    if !response.status().is_success() {
        bail!("server unhealthy: {}", response.status());
    }
    Ok(())
}

async fn send_event(client: &reqwest::Client, base_url: &str, event: &Value) -> Result<i64> {
    let response = client
        .post(format!("{base_url}/events"))
        .json(event)
        .timeout(Duration::from_secs(5))
        .send()
        .await?;
    if !response.status().is_success() {
        bail!("server rejected event: {}", response.status());
    }
    let body: Value = response.json().await?;
    Ok(body["event_id"].as_i64().unwrap_or(0))
}

#[tokio::main]
async fn main() -> Result<()> {
    let base_url = server_url();
    let client = reqwest::Client::new();

    println!("Pulseboard seed-events generator");
    println!("Target: {base_url}");

    check_health(&client, &base_url)
        .await
        .context("is pulseboard-server running?")?;

    // Generate everything up front; ThreadRng must not be held across awaits.
    let sessions: Vec<(String, Vec<Value>)> = {
        let mut rng = thread_rng();
        (0..NUM_SESSIONS)
            .map(|_| {
                let session_id = format!("session_{}", short_hex(8));
                let events = generate_session_events(&mut rng, &session_id);
                (session_id, events)
            })
            .collect()
    };

    let mut total = 0usize;
    let mut sent = 0usize;
    for (session_id, events) in &sessions {
        println!("Session {session_id}: {} events", events.len());
        for event in events {
            total += 1;
            tokio::time::sleep(Duration::from_millis(100 + rand::random::<u64>() % 200)).await;
            match send_event(&client, &base_url, event).await {
                Ok(event_id) => {
                    sent += 1;
                    println!("  sent {} (id {event_id})", event["kind"].as_str().unwrap_or("?"));
                }
                Err(e) => println!("  failed to send {}: {e}", event["kind"].as_str().unwrap_or("?")),
            }
        }
    }

    println!("Done: {sent}/{total} events sent across {} sessions", sessions.len());
    if sent != total {
        bail!("{} events failed to send", total - sent);
    }
    Ok(())
}
