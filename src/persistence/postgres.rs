//! PostgreSQL implementation of the event log.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::NewEventRow;
use crate::config::MarketConfig;
use crate::domain::MarketEvent;
use crate::error::MarketError;

fn db_error(e: impl std::fmt::Display) -> MarketError {
    MarketError::PersistenceError(e.to_string())
}

/// PostgreSQL-backed event log using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the pool settings from `config` and applies pending
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &MarketConfig) -> Result<Self, MarketError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(db_error)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(db_error)?;
        Ok(Self::new(pool))
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] on serialization or
    /// database failure.
    pub async fn save_event(&self, event: &MarketEvent) -> Result<i64, MarketError> {
        let row = NewEventRow::try_from(event)?;
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO market_events (subject_id, event_type, payload) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(row.subject_id)
        .bind(row.event_type)
        .bind(&row.payload)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    /// Deletes events older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] on database failure.
    pub async fn delete_old_events(&self, before_days: u64) -> Result<u64, MarketError> {
        let days = i64::try_from(before_days).unwrap_or(i64::MAX);
        let cutoff = TimeDelta::try_days(days)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let result = sqlx::query("DELETE FROM market_events WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
