//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use dojo_brackets::db::DatabaseConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default HTTP bind address
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 6969);

/// Where brackets are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process memory; lost on restart
    Memory,
    /// PostgreSQL through `DATABASE_URL`
    Postgres,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration, `None` for in-memory storage
    pub database: Option<DatabaseConfig>,
    /// Prometheus scrape listener
    pub metrics_bind: Option<SocketAddr>,
    /// Fixed seed for reproducible round 1 draws
    pub rng_seed: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_opt("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .filter(|url| !url.trim().is_empty());

        let backend = match std::env::var("BRACKET_STORAGE").ok().as_deref() {
            None => None,
            Some("memory") => Some(StorageBackend::Memory),
            Some("postgres") => Some(StorageBackend::Postgres),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "BRACKET_STORAGE".to_string(),
                    reason: format!("Expected \"memory\" or \"postgres\", got {other:?}"),
                });
            }
        };

        let database = match (backend, database_url) {
            (Some(StorageBackend::Memory), _) => None,
            (Some(StorageBackend::Postgres), None) => {
                return Err(ConfigError::MissingRequired {
                    var: "DATABASE_URL".to_string(),
                    hint: "Set it or use BRACKET_STORAGE=memory".to_string(),
                });
            }
            (_, Some(database_url)) => Some(DatabaseConfig::from_env_with_url(database_url)),
            (None, None) => None,
        };

        Ok(ServerConfig {
            bind,
            database,
            metrics_bind: parse_env_opt("METRICS_BIND")?,
            rng_seed: parse_env_opt("BRACKET_RNG_SEED")?,
        })
    }

    /// Storage selected by this configuration
    pub fn storage(&self) -> StorageBackend {
        if self.database.is_some() {
            StorageBackend::Postgres
        } else {
            StorageBackend::Memory
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(database) = &self.database {
            if database.max_connections == 0 {
                return Err(ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS".to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }

            if database.min_connections > database.max_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed max connections ({})",
                        database.max_connections
                    ),
                });
            }
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Optional environment variable that must parse when present
fn parse_env_opt<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map(Some).map_err(|e| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("{e}"),
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "SERVER_BIND",
        "DATABASE_URL",
        "BRACKET_STORAGE",
        "METRICS_BIND",
        "BRACKET_RNG_SEED",
        "DB_MAX_CONNECTIONS",
        "DB_IDLE_TIMEOUT",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: env-touching tests run serially
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: env-touching tests run serially
        unsafe { std::env::set_var(key, value) };
    }

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: Some(DatabaseConfig::with_url("test")),
            metrics_bind: None,
            rng_seed: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "Use memory".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("Use memory"));
    }

    #[test]
    #[serial]
    fn test_defaults_use_memory_storage() {
        clear_env();
        let config = ServerConfig::from_env(None, None).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.storage(), StorageBackend::Memory);
        assert!(config.metrics_bind.is_none());
        assert!(config.rng_seed.is_none());
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn test_env_values_and_overrides() {
        clear_env();
        set_env("SERVER_BIND", "0.0.0.0:7000");
        set_env("DATABASE_URL", "postgres://dojo@db/dojo");
        set_env("DB_MAX_CONNECTIONS", "4");
        set_env("DB_IDLE_TIMEOUT", "5");
        set_env("BRACKET_RNG_SEED", "42");

        let config = ServerConfig::from_env(None, None).unwrap();
        assert_eq!(config.bind, "0.0.0.0:7000".parse().unwrap());
        assert_eq!(config.rng_seed, Some(42));
        let database = config.database.as_ref().unwrap();
        assert_eq!(database.database_url, "postgres://dojo@db/dojo");
        assert_eq!(database.max_connections, 4);
        assert_eq!(database.idle_timeout_secs, 5);
        assert_eq!(
            database,
            &DatabaseConfig::from_env_with_url("postgres://dojo@db/dojo")
        );

        let overridden = ServerConfig::from_env(
            Some("127.0.0.1:9000".parse().unwrap()),
            Some("postgres://other/dojo".to_string()),
        )
        .unwrap();
        assert_eq!(overridden.bind.port(), 9000);
        assert_eq!(
            overridden.database.unwrap().database_url,
            "postgres://other/dojo"
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_seed_rejected() {
        clear_env();
        set_env("BRACKET_RNG_SEED", "not-a-number");
        let err = ServerConfig::from_env(None, None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "BRACKET_RNG_SEED"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_postgres_storage_requires_url() {
        clear_env();
        set_env("BRACKET_STORAGE", "postgres");
        let err = ServerConfig::from_env(None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));

        set_env("BRACKET_STORAGE", "memory");
        set_env("DATABASE_URL", "postgres://dojo@db/dojo");
        let config = ServerConfig::from_env(None, None).unwrap();
        assert_eq!(config.storage(), StorageBackend::Memory);
        clear_env();
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut config = config();
        if let Some(database) = config.database.as_mut() {
            database.min_connections = 20;
            database.max_connections = 5;
        }
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_metrics_port_clash() {
        let mut config = config();
        config.metrics_bind = Some(config.bind);
        assert!(config.validate().is_err());

        config.metrics_bind = Some("127.0.0.1:9090".parse().unwrap());
        assert!(config.validate().is_ok());
    }
}
