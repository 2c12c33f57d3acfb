// Dashboard client engine
//
// Reconstructs a live view of agent-session state from two sources: a
// historical snapshot pulled from the query API (bootstrap) and the SSE
// live stream (merge). The two are reconciled by event id; everything the
// dashboard shows (session groups, tool pairings, alerts, timeline
// positions) is derived from the merged event set.
//
// Key design decisions:
// - State is single-threaded; the stream consumer, poll timer, and clock
//   tick are just separate await points in the driver
// - Disconnects keep local state and re-bootstrap on reconnect (gap-fill);
//   dedup by id makes the replayed history idempotent
// - Retention is bounded by the selected window (no unbounded growth)

pub mod api;
pub mod dashboard;
pub mod live;
pub mod pairing;
pub mod palette;
pub mod state;

pub use api::ApiClient;
pub use dashboard::{AggregateSnapshot, Dashboard};
pub use live::{backoff_delay, LiveStream};
pub use pairing::{pair_events, ToolPair};
pub use palette::color_for;
pub use state::{AppGroup, DashboardState, SessionView};
