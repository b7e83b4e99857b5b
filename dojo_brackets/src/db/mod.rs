//! PostgreSQL access for brackets and registrations.
//!
//! [`Database`] owns the pool shared by the bracket store and the
//! registration lookup, and can create the bracket schema on startup.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::{sync::Arc, time::Duration};

pub mod config;
pub mod registrations;

pub use config::DatabaseConfig;
pub use registrations::{ParticipantSource, PgRegistrationRepository, StaticParticipantSource};

/// Idempotent DDL for the `event_brackets` table
pub const BRACKET_SCHEMA: &str = include_str!("../../migrations/0001_event_brackets.sql");

/// Pooled PostgreSQL connection
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Connect using the pool settings of `config`
    ///
    /// ```no_run
    /// use dojo_brackets::db::{Database, DatabaseConfig};
    /// use dojo_brackets::PgBracketStore;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let db = Database::new(&DatabaseConfig::from_env().unwrap_or_default()).await?;
    ///     db.apply_schema().await?;
    ///     let store = PgBracketStore::new(db.shared_pool());
    ///     # let _ = store;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        log::debug!(
            "Connected pool (max {} connections)",
            config.max_connections
        );

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pool handle for stores and repositories
    pub fn shared_pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// Create the bracket table and index when missing
    pub async fn apply_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(BRACKET_SCHEMA).execute(self.pool()).await?;
        Ok(())
    }

    /// Round trip used by the server health endpoint
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(self.pool()).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
