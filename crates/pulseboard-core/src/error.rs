// Error types for the telemetry pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PulseboardError>;

/// Errors that can occur while ingesting or querying events.
///
/// Delivery gaps (a client disconnected during one or more publishes) are
/// deliberately NOT an error variant: the broadcast path is at-most-once
/// by design and clients recover by re-bootstrapping.
#[derive(Debug, Error)]
pub enum PulseboardError {
    /// Malformed or incomplete ingested event: rejected, never persisted,
    /// never broadcast.
    #[error("validation error: {0}")]
    Validation(String),

    /// Persistence layer unavailable or write failed: surfaced to the
    /// ingestion caller as a server error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Malformed time-window or filter parameters: rejected, never
    /// partially executed.
    #[error("query error: {0}")]
    Query(String),
}

impl PulseboardError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        PulseboardError::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        PulseboardError::Storage(msg.into())
    }

    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        PulseboardError::Query(msg.into())
    }
}
