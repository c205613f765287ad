// ABOUTME: The LogStore trait every ordered-log backend implements, and its error taxonomy.
// ABOUTME: Handlers only hold an Arc<dyn LogStore>; ordering and atomicity live in the backend.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::entry::{EntryId, Field, LogEntry};
use crate::stream::StreamName;

/// Errors a store backend can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the connection broke mid-call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but refused the command.
    #[error("store rejected the command: {0}")]
    Rejected(String),

    /// Data read back from the store could not be decoded.
    #[error("corrupt entry in stream {stream}: {reason}")]
    Corrupt { stream: String, reason: String },
}

impl StoreError {
    /// True when the failure is about reaching the store rather than the command itself.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// An append-only, multi-reader ordered log.
///
/// Implementations must be safe to share across concurrent requests and
/// must assign each appended entry an id strictly greater than every id
/// previously assigned in the same stream.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append one entry made of `fields` and return the id the store assigned.
    async fn append(&self, stream: &StreamName, fields: &[Field]) -> Result<EntryId, StoreError>;

    /// Number of entries currently in the stream. Missing streams have length zero.
    async fn len(&self, stream: &StreamName) -> Result<u64, StoreError>;

    /// Up to `count` entries with ids strictly greater than `after`, oldest first.
    /// `None` reads from the beginning of the stream.
    ///
    /// Field values come back byte for byte, but the order of fields within
    /// an entry is backend specific: Redis returns them sorted by name, the
    /// other backends keep append order. Look fields up by name.
    async fn range(
        &self,
        stream: &StreamName,
        after: Option<EntryId>,
        count: usize,
    ) -> Result<Vec<LogEntry>, StoreError>;

    /// Round-trip to the store without touching any stream.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name used in logs and readiness responses.
    fn backend(&self) -> &'static str;
}

/// Shared, thread-safe store handle injected into request handlers.
pub type SharedStore = Arc<dyn LogStore>;
