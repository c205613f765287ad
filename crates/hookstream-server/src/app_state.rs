// ABOUTME: Shared application state for the hookstream HTTP server.
// ABOUTME: Holds the injected store handle plus the stream, field, and limits every handler reads.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hookstream_core::{SharedStore, StoreError, StreamName};

use crate::config::{DEFAULT_FIELD, DEFAULT_MAX_BODY_BYTES, DEFAULT_STORE_TIMEOUT, ServerConfig};
use crate::error::IngestError;

/// Shared application state accessible by all Axum handlers.
///
/// Nothing in here is mutated after startup; the store handle is the only
/// resource shared between requests and is safe for concurrent use.
pub struct AppState {
    pub store: SharedStore,
    pub stream: StreamName,
    pub field: String,
    pub store_timeout: Duration,
    pub max_body_bytes: usize,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create state around a store using the default stream, field, and limits.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            stream: StreamName::default(),
            field: DEFAULT_FIELD.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Create state from loaded configuration.
    pub fn from_config(store: SharedStore, config: &ServerConfig) -> Self {
        Self {
            store,
            stream: config.stream.clone(),
            field: config.field.clone(),
            store_timeout: config.store_timeout,
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Run one store call, failing with `IngestError::Timeout` if it outlives `store_timeout`.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, IngestError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(IngestError::Store),
            Err(_) => Err(IngestError::Timeout(self.store_timeout)),
        }
    }
}
