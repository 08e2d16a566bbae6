//! Configuration loading and representation.
//!
//! All settings come from environment variables; every one has a default so the
//! service starts with no configuration at all (in-memory SQLite, JSON logs).

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use inventario_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },
}

impl ConfigError {
    fn invalid(var: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            message: message.into(),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// In-memory SQLite with default pool settings (dev/test).
    pub fn in_memory() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database: DatabaseConfig,
    /// Wrap `read` listings in the `{status, message, data}` envelope instead of
    /// returning a bare array.
    pub read_envelope: bool,
    /// Append raw database error text to caller-facing messages.
    pub expose_db_errors: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests use a map instead of the environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::invalid("DB_MAX_CONNECTIONS", format!("{v:?} is not a positive integer")))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let acquire_timeout_secs = match get("DB_ACQUIRE_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid("DB_ACQUIRE_TIMEOUT_SECS", e.to_string()))?,
            None => DEFAULT_ACQUIRE_TIMEOUT_SECS,
        };

        let log_format = match get("LOG_FORMAT") {
            Some(v) => v
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            database: DatabaseConfig {
                url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                max_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            },
            read_envelope: parse_bool("READ_ENVELOPE", get("READ_ENVELOPE"))?,
            expose_db_errors: parse_bool("EXPOSE_DB_ERRORS", get("EXPOSE_DB_ERRORS"))?,
            log_format,
        })
    }

    /// Defaults with an in-memory database (same as an empty environment).
    pub fn in_memory() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            database: DatabaseConfig::in_memory(),
            read_envelope: false,
            expose_db_errors: false,
            log_format: LogFormat::default(),
        }
    }
}

fn parse_bool(var: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value {
        None => Ok(false),
        Some(v) => v
            .trim()
            .to_ascii_lowercase()
            .parse::<bool>()
            .or_else(|_| match v.trim() {
                "1" => Ok(true),
                "0" => Ok(false),
                other => Err(ConfigError::invalid(var, format!("{other:?} is not a boolean"))),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.database.acquire_timeout, Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS));
        assert!(!cfg.read_envelope);
        assert!(!cfg.expose_db_errors);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = load(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/inventario"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "2"),
            ("READ_ENVELOPE", "true"),
            ("EXPOSE_DB_ERRORS", "1"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.database.url, "postgres://localhost/inventario");
        assert_eq!(cfg.database.max_connections, 12);
        assert_eq!(cfg.database.acquire_timeout, Duration::from_secs(2));
        assert!(cfg.read_envelope);
        assert!(cfg.expose_db_errors);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_are_reported_with_variable_name() {
        let err = load(&[("DB_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert!(err.to_string().starts_with("DB_MAX_CONNECTIONS"));

        let err = load(&[("READ_ENVELOPE", "sometimes")]).unwrap_err();
        assert!(err.to_string().starts_with("READ_ENVELOPE"));

        let err = load(&[("BIND_ADDR", "not-an-addr")]).unwrap_err();
        assert!(err.to_string().starts_with("BIND_ADDR"));
    }
}
