//! Persistence layer: PostgreSQL event log.
//!
//! The in-memory stores are authoritative. When persistence is enabled,
//! a background writer subscribes to the [`crate::domain::EventBus`] and
//! appends every event to the `market_events` table through `sqlx::PgPool`.

pub mod event_log;
pub mod models;
pub mod postgres;

pub use event_log::{spawn_cleanup, spawn_event_log};
pub use postgres::PostgresPersistence;
