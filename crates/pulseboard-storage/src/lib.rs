// SQLite storage layer with sqlx
//
// This crate owns the only durable state in the system: one append-only
// events table with indexes on timestamp, session_id, and kind. Everything
// served by the aggregation API is computed from that table at query time;
// there are no materialized views.

pub mod aggregates;
pub mod database;
pub mod models;

pub use database::Database;
pub use models::*;
