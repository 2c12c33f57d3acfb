// Dashboard state: merged event set and everything derived from it
//
// One DashboardState per dashboard instance. Events arrive from the
// bootstrap snapshot and from the live stream; both paths go through
// insert(), which dedups by store id. A clock tick advances the "now"
// cursor and prunes events that left the selected window, so memory is
// bounded by the window rather than by uptime.

use std::collections::{BTreeMap, HashMap};

use pulseboard_core::{Event, EventKind};

use crate::pairing::{pair_events, ToolPair};
use crate::palette::color_for;

/// A session alerts when its most recent terminal/notification event is
/// this fresh and newer than its most recent prompt.
pub const ALERT_RECENCY_MS: i64 = 3 * 60 * 1000;

/// One session as the dashboard shows it.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session_id: String,
    pub source_app: Option<String>,
    pub model_name: Option<String>,
    pub last_event_kind: EventKind,
    pub last_activity: i64,
    pub event_count: usize,
    /// Needs attention: a terminal/notification event arrived after the
    /// last prompt and is still fresh.
    pub alerting: bool,
    /// Stable palette color for this session.
    pub color: &'static str,
}

/// Sessions grouped by the project that produced them.
#[derive(Debug, Clone)]
pub struct AppGroup {
    pub source_app: String,
    pub sessions: Vec<SessionView>,
}

pub struct DashboardState {
    /// Events keyed by store id (the dedup key).
    events: BTreeMap<i64, Event>,
    window_ms: i64,
    now_ms: i64,
    connected: bool,
}

impl DashboardState {
    pub fn new(window_ms: i64, now_ms: i64) -> Self {
        Self {
            events: BTreeMap::new(),
            window_ms,
            now_ms,
            connected: false,
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn mark_connected(&mut self) {
        self.connected = true;
    }

    pub fn mark_disconnected(&mut self) {
        self.connected = false;
    }

    /// Change the selected window. The caller re-bootstraps afterwards;
    /// pruning happens immediately so a narrower window shrinks state now.
    pub fn set_window(&mut self, window_ms: i64) {
        self.window_ms = window_ms;
        self.prune();
    }

    /// Merge one event. Returns false if it was already present (same id).
    pub fn insert(&mut self, event: Event) -> bool {
        if self.events.contains_key(&event.id) {
            return false;
        }
        if event.timestamp < self.window_floor() {
            // Already expired for the selected window.
            return false;
        }
        self.events.insert(event.id, event);
        true
    }

    /// Merge a bootstrap snapshot. Returns how many events were new.
    pub fn apply_snapshot(&mut self, events: Vec<Event>) -> usize {
        let mut added = 0;
        for event in events {
            if self.insert(event) {
                added += 1;
            }
        }
        added
    }

    /// Merge one live-stream event.
    pub fn apply_live(&mut self, event: Event) -> bool {
        self.insert(event)
    }

    /// Advance the "now" cursor and drop events that left the window.
    pub fn tick(&mut self, now_ms: i64) {
        self.now_ms = now_ms;
        self.prune();
    }

    fn window_floor(&self) -> i64 {
        self.now_ms - self.window_ms
    }

    fn prune(&mut self) {
        let floor = self.window_floor();
        self.events.retain(|_, e| e.timestamp >= floor);
    }

    /// Fraction of the window this event has aged through: 0.0 at "now",
    /// 1.0 at the expired edge. None when outside the window entirely.
    pub fn position(&self, event: &Event) -> Option<f64> {
        let age = self.now_ms - event.timestamp;
        if age < 0 || age > self.window_ms {
            return None;
        }
        Some(age as f64 / self.window_ms as f64)
    }

    /// All retained events in (timestamp, id) ascending order: the
    /// canonical order for pairing and timeline rendering.
    pub fn ordered_events(&self) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.values().collect();
        events.sort_by_key(|e| (e.timestamp, e.id));
        events
    }

    /// Tool invocation pairs over the current event set. Deterministic:
    /// the same event set always yields the same pairs.
    pub fn tool_pairs(&self) -> Vec<ToolPair> {
        pair_events(self.ordered_events())
    }

    /// Per-session views, most recently active first.
    pub fn sessions(&self) -> Vec<SessionView> {
        let mut by_session: HashMap<&str, Vec<&Event>> = HashMap::new();
        for event in self.ordered_events() {
            by_session.entry(&event.session_id).or_default().push(event);
        }

        let mut views: Vec<SessionView> = by_session
            .into_iter()
            .map(|(session_id, events)| {
                // events are already (timestamp, id) ascending
                let last = events.last().expect("group is non-empty");
                SessionView {
                    session_id: session_id.to_string(),
                    source_app: last.source_app.clone(),
                    model_name: last.model_name.clone(),
                    last_event_kind: last.kind.clone(),
                    last_activity: last.timestamp,
                    event_count: events.len(),
                    alerting: derive_alert(&events, self.now_ms),
                    color: color_for(session_id),
                }
            })
            .collect();

        views.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        views
    }

    /// Sessions grouped by source_app; events with no source_app land in
    /// the "unknown" group. Groups sorted by name, sessions by recency.
    pub fn groups(&self) -> Vec<AppGroup> {
        let mut grouped: BTreeMap<String, Vec<SessionView>> = BTreeMap::new();
        for view in self.sessions() {
            let app = view
                .source_app
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            grouped.entry(app).or_default().push(view);
        }
        grouped
            .into_iter()
            .map(|(source_app, sessions)| AppGroup {
                source_app,
                sessions,
            })
            .collect()
    }
}

/// A session alerts when its most recent attention event (Notification or
/// SessionEnd) is within ALERT_RECENCY_MS of now and strictly newer than
/// its most recent UserPromptSubmit. Submitting a new prompt clears it.
fn derive_alert(session_events: &[&Event], now_ms: i64) -> bool {
    let last_attention = session_events
        .iter()
        .rev()
        .find(|e| e.kind.is_attention())
        .map(|e| e.timestamp);
    let last_prompt = session_events
        .iter()
        .rev()
        .find(|e| e.kind == EventKind::UserPromptSubmit)
        .map(|e| e.timestamp);

    match last_attention {
        Some(attention) if now_ms - attention <= ALERT_RECENCY_MS => {
            last_prompt.map_or(true, |prompt| attention > prompt)
        }
        _ => false,
    }
}
