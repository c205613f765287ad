// ABOUTME: Configuration loading and validation for the hookstream server.
// ABOUTME: Reads HOOKSTREAM_* and REDIS_* environment variables; empty values count as unset.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use hookstream_core::{StreamName, StreamNameError};
use hookstream_store::{RedisSettings, StoreConfig, StoreKind, TlsFiles};
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_FIELD: &str = "data";
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_SQLITE_PATH: &str = "hookstream.db";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOOKSTREAM_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("HOOKSTREAM_STORE must be one of redis, sqlite, memory; got {0:?}")]
    UnknownStore(String),

    #[error("HOOKSTREAM_STREAM is invalid: {0}")]
    InvalidStream(#[from] StreamNameError),

    #[error("HOOKSTREAM_FIELD must not contain whitespace")]
    InvalidField,

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("REDIS_CLIENT_CERT and REDIS_CLIENT_KEY must be set together")]
    IncompleteClientIdentity,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub store: StoreConfig,
    pub stream: StreamName,
    pub field: String,
    pub store_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            store: StoreConfig::Redis(RedisSettings {
                connect_timeout: DEFAULT_STORE_TIMEOUT,
                ..RedisSettings::default()
            }),
            stream: StreamName::default(),
            field: DEFAULT_FIELD.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn positive<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError::InvalidNumber { var, value }),
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - HOOKSTREAM_BIND: socket address to bind (default: 127.0.0.1:5000)
    /// - HOOKSTREAM_STORE: redis, sqlite, or memory (default: redis)
    /// - HOOKSTREAM_STREAM: stream name (default: hooks)
    /// - HOOKSTREAM_FIELD: entry field holding the record (default: data)
    /// - HOOKSTREAM_APPEND_TIMEOUT_MS: bound on each store call (default: 5000)
    /// - HOOKSTREAM_MAX_BODY_BYTES: request body limit (default: 1048576)
    /// - HOOKSTREAM_SQLITE_PATH: database file for the sqlite store (default: hookstream.db)
    /// - REDIS_HOST, REDIS_PORT, REDIS_DB: Redis location (default: localhost, 6379, 0)
    /// - REDIS_USERNAME, REDIS_PASSWORD: ACL credentials (optional)
    /// - REDIS_TLS: enable TLS (default: false)
    /// - REDIS_CA_CERT, REDIS_CLIENT_CERT, REDIS_CLIENT_KEY: PEM files for TLS (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_str = var("HOOKSTREAM_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let stream = match var("HOOKSTREAM_STREAM") {
            Some(name) => StreamName::new(name)?,
            None => StreamName::default(),
        };

        let field = var("HOOKSTREAM_FIELD").unwrap_or_else(|| DEFAULT_FIELD.to_string());
        if field.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidField);
        }

        let store_timeout = match var("HOOKSTREAM_APPEND_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(positive("HOOKSTREAM_APPEND_TIMEOUT_MS", v)?),
            None => DEFAULT_STORE_TIMEOUT,
        };

        let max_body_bytes = match var("HOOKSTREAM_MAX_BODY_BYTES") {
            Some(v) => positive("HOOKSTREAM_MAX_BODY_BYTES", v)?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let kind = match var("HOOKSTREAM_STORE") {
            Some(v) => v.parse::<StoreKind>().map_err(ConfigError::UnknownStore)?,
            None => StoreKind::Redis,
        };

        let store = match kind {
            StoreKind::Redis => StoreConfig::Redis(redis_settings(&var, store_timeout)?),
            StoreKind::Sqlite => StoreConfig::Sqlite {
                path: var("HOOKSTREAM_SQLITE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            },
            StoreKind::Memory => StoreConfig::Memory,
        };

        Ok(Self {
            bind,
            store,
            stream,
            field,
            store_timeout,
            max_body_bytes,
        })
    }
}

fn redis_settings<F>(var: &F, connect_timeout: Duration) -> Result<RedisSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = RedisSettings::default();

    let port = match var("REDIS_PORT") {
        Some(v) => positive("REDIS_PORT", v)?,
        None => defaults.port,
    };

    let db = match var("REDIS_DB") {
        Some(v) => v
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|db| *db >= 0)
            .ok_or(ConfigError::InvalidNumber {
                var: "REDIS_DB",
                value: v,
            })?,
        None => defaults.db,
    };

    let tls = if var("REDIS_TLS").is_some_and(|v| is_truthy(&v)) {
        let client_identity = match (var("REDIS_CLIENT_CERT"), var("REDIS_CLIENT_KEY")) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteClientIdentity),
        };
        Some(TlsFiles {
            ca_cert: var("REDIS_CA_CERT").map(PathBuf::from),
            client_identity,
        })
    } else {
        None
    };

    Ok(RedisSettings {
        host: var("REDIS_HOST").unwrap_or(defaults.host),
        port,
        db,
        username: var("REDIS_USERNAME"),
        password: var("REDIS_PASSWORD"),
        tls,
        connect_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn config_loads_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.bind, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.stream.as_str(), "hooks");
        assert_eq!(config.field, "data");
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.max_body_bytes, 1024 * 1024);

        match config.store {
            StoreConfig::Redis(settings) => {
                assert_eq!(settings.host, "localhost");
                assert_eq!(settings.port, 6379);
                assert_eq!(settings.db, 0);
                assert!(settings.tls.is_none());
            }
            other => panic!("expected redis store, got {other:?}"),
        }
    }

    #[test]
    fn config_matches_default_impl() {
        let loaded = load(&[]).unwrap();
        let default = ServerConfig::default();
        assert_eq!(loaded.bind, default.bind);
        assert_eq!(loaded.store, default.store);
    }

    #[test]
    fn config_reads_redis_location() {
        let config = load(&[
            ("REDIS_HOST", "redis"),
            ("REDIS_PORT", "6380"),
            ("REDIS_DB", "2"),
            ("REDIS_PASSWORD", "secret"),
            ("HOOKSTREAM_STREAM", "events"),
            ("HOOKSTREAM_APPEND_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(config.stream.as_str(), "events");
        let StoreConfig::Redis(settings) = config.store else {
            panic!("expected redis store");
        };
        assert_eq!(settings.host, "redis");
        assert_eq!(settings.port, 6380);
        assert_eq!(settings.db, 2);
        assert_eq!(settings.password.as_deref(), Some("secret"));
        assert_eq!(settings.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn config_reads_tls_files() {
        let config = load(&[
            ("REDIS_TLS", "yes"),
            ("REDIS_CA_CERT", "/etc/ca.pem"),
            ("REDIS_CLIENT_CERT", "/etc/client.pem"),
            ("REDIS_CLIENT_KEY", "/etc/client.key"),
        ])
        .unwrap();

        let StoreConfig::Redis(settings) = config.store else {
            panic!("expected redis store");
        };
        let tls = settings.tls.expect("tls should be enabled");
        assert_eq!(tls.ca_cert, Some(PathBuf::from("/etc/ca.pem")));
        assert_eq!(
            tls.client_identity,
            Some((PathBuf::from("/etc/client.pem"), PathBuf::from("/etc/client.key")))
        );
    }

    #[test]
    fn config_rejects_half_client_identity() {
        let err = load(&[("REDIS_TLS", "true"), ("REDIS_CLIENT_CERT", "/etc/client.pem")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteClientIdentity));
    }

    #[test]
    fn config_selects_sqlite_and_memory() {
        let config = load(&[("HOOKSTREAM_STORE", "sqlite"), ("HOOKSTREAM_SQLITE_PATH", "/var/lib/hooks.db")])
            .unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Sqlite {
                path: PathBuf::from("/var/lib/hooks.db")
            }
        );

        let config = load(&[("HOOKSTREAM_STORE", "memory")]).unwrap();
        assert_eq!(config.store, StoreConfig::Memory);
    }

    #[test]
    fn config_rejects_bad_values() {
        assert!(matches!(
            load(&[("HOOKSTREAM_BIND", "not an address")]),
            Err(ConfigError::InvalidBind(_))
        ));
        assert!(matches!(
            load(&[("HOOKSTREAM_STORE", "kafka")]),
            Err(ConfigError::UnknownStore(_))
        ));
        assert!(matches!(
            load(&[("HOOKSTREAM_STREAM", "two words")]),
            Err(ConfigError::InvalidStream(_))
        ));
        assert!(matches!(
            load(&[("HOOKSTREAM_FIELD", "da ta")]),
            Err(ConfigError::InvalidField)
        ));
        assert!(matches!(
            load(&[("HOOKSTREAM_APPEND_TIMEOUT_MS", "0")]),
            Err(ConfigError::InvalidNumber { var: "HOOKSTREAM_APPEND_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            load(&[("HOOKSTREAM_MAX_BODY_BYTES", "-5")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            load(&[("REDIS_PORT", "70000")]),
            Err(ConfigError::InvalidNumber { var: "REDIS_PORT", .. })
        ));
        assert!(matches!(
            load(&[("REDIS_DB", "-1")]),
            Err(ConfigError::InvalidNumber { var: "REDIS_DB", .. })
        ));
    }

    #[test]
    fn config_treats_empty_values_as_unset() {
        let config = load(&[("HOOKSTREAM_BIND", ""), ("HOOKSTREAM_STREAM", "  ")]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.stream.as_str(), "hooks");
    }

    #[test]
    fn config_error_names_the_variable() {
        let err = load(&[("HOOKSTREAM_MAX_BODY_BYTES", "lots")]).unwrap_err();
        assert!(
            err.to_string().contains("HOOKSTREAM_MAX_BODY_BYTES"),
            "error should mention the variable: {}",
            err
        );
    }
}
