// ABOUTME: Backend selection: StoreConfig names a backend and connect() opens it as a shared LogStore.
// ABOUTME: Called once at startup; the resulting handle is injected into the HTTP server.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use hookstream_core::SharedStore;
use thiserror::Error;

use crate::memory::MemoryLog;
use crate::redis_log::{RedisLog, RedisSettings};
use crate::sqlite::SqliteLog;

/// Errors that can occur while opening a store backend.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read certificate {}: {source}", path.display())]
    Certificate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("timed out after {0:?} connecting to the store")]
    Timeout(Duration),
}

/// The backend kinds that can be named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Sqlite,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreKind::Redis),
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" => Ok(StoreKind::Memory),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::Redis => "redis",
            StoreKind::Sqlite => "sqlite",
            StoreKind::Memory => "memory",
        })
    }
}

/// A fully specified backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Redis(RedisSettings),
    Sqlite { path: PathBuf },
    Memory,
}

impl StoreConfig {
    pub fn kind(&self) -> StoreKind {
        match self {
            StoreConfig::Redis(_) => StoreKind::Redis,
            StoreConfig::Sqlite { .. } => StoreKind::Sqlite,
            StoreConfig::Memory => StoreKind::Memory,
        }
    }
}

/// Open the configured backend and return it as a shared handle.
pub async fn connect(config: &StoreConfig) -> Result<SharedStore, ConnectError> {
    let store: SharedStore = match config {
        StoreConfig::Redis(settings) => Arc::new(RedisLog::connect(settings).await?),
        StoreConfig::Sqlite { path } => {
            let log = SqliteLog::open(path)?;
            tracing::info!(path = %path.display(), "opened sqlite log");
            Arc::new(log)
        }
        StoreConfig::Memory => {
            tracing::warn!("using in-memory log; entries are lost on exit");
            Arc::new(MemoryLog::new())
        }
    };
    Ok(store)
}
