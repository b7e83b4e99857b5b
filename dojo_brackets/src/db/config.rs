//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use std::{env, str::FromStr};

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create a configuration for `database_url` with default pool settings
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::development()
        }
    }

    /// Create configuration from environment variables
    ///
    /// Returns `None` when `DATABASE_URL` is not set. Pool settings are read
    /// as in [`DatabaseConfig::from_env_with_url`].
    pub fn from_env() -> Option<Self> {
        let database_url = env::var("DATABASE_URL").ok()?;
        Some(Self::from_env_with_url(database_url))
    }

    /// Pool settings from the environment for an already chosen URL
    ///
    /// Environment variables:
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env_with_url(database_url: impl Into<String>) -> Self {
        let defaults = Self::development();

        Self {
            database_url: database_url.into(),
            max_connections: env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: env_or(
                "DB_CONNECTION_TIMEOUT",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT", defaults.idle_timeout_secs),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME", defaults.max_lifetime_secs),
        }
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/dojo_db` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/dojo_db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}", name, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_with_url_keeps_pool_defaults() {
        let config = DatabaseConfig::with_url("postgres://dojo@db/dojo");
        assert_eq!(config.database_url, "postgres://dojo@db/dojo");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
    }

    #[test]
    fn test_default_is_development() {
        assert_eq!(DatabaseConfig::default(), DatabaseConfig::development());
    }

    #[test]
    #[serial]
    fn test_from_env_with_url_reads_pool_settings() {
        // SAFETY: env-touching tests run serially
        unsafe {
            std::env::set_var("DB_IDLE_TIMEOUT", "5");
            std::env::set_var("DB_MAX_LIFETIME", "60");
        }

        let config = DatabaseConfig::from_env_with_url("postgres://dojo@db/dojo");
        assert_eq!(config.database_url, "postgres://dojo@db/dojo");
        assert_eq!(config.idle_timeout_secs, 5);
        assert_eq!(config.max_lifetime_secs, 60);
        assert_eq!(config.connection_timeout_secs, 10);

        unsafe {
            std::env::remove_var("DB_IDLE_TIMEOUT");
            std::env::remove_var("DB_MAX_LIFETIME");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_url_and_tolerates_bad_numbers() {
        // SAFETY: env-touching tests run serially
        unsafe {
            std::env::remove_var("DATABASE_URL");
            std::env::remove_var("DB_MIN_CONNECTIONS");
        }
        assert!(DatabaseConfig::from_env().is_none());

        unsafe {
            std::env::set_var("DATABASE_URL", "postgres://dojo@localhost/dojo");
            std::env::set_var("DB_MAX_CONNECTIONS", "lots");
        }
        let config = DatabaseConfig::from_env().expect("url set");
        assert_eq!(config.database_url, "postgres://dojo@localhost/dojo");
        assert_eq!(config.max_connections, 10);

        unsafe {
            std::env::remove_var("DATABASE_URL");
            std::env::remove_var("DB_MAX_CONNECTIONS");
        }
    }
}
