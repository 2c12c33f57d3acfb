// Core Telemetry Types
//
// This crate defines the domain vocabulary shared by the server, storage,
// and client crates:
//
// Key design decisions:
// - Event is the only persisted entity; sessions and series are read-time projections
// - EventKind is string-backed with an Other fallback (unknown producer kinds round-trip)
// - Timestamp resolution honors the occurrence time embedded in TokenUsage payloads
// - Error taxonomy distinguishes Validation (4xx), Storage (5xx), and Query (4xx) failures
// - Projection DTOs carry optional utoipa schemas behind the "openapi" feature

pub mod error;
pub mod event;
pub mod kind;
pub mod projections;
pub mod token;

// Re-exports for convenience
pub use error::{PulseboardError, Result};
pub use event::{Event, IngestEvent};
pub use kind::EventKind;
pub use projections::{
    ActiveSession, SessionTokenBucket, SessionTokens, TokenBucket, TokenStats, TokenTotals,
    ToolCount, ToolOutcomes, ToolUsageStats,
};
pub use token::{occurrence_time_ms, TokenUsage};
