// ABOUTME: Core types for hookstream: records, entry ids, stream names, and the LogStore trait.
// ABOUTME: Backends live in hookstream-store; the HTTP surface lives in hookstream-server.

pub mod entry;
pub mod store;
pub mod stream;
pub mod testing;

pub use entry::{EntryId, EntryIdError, Field, LogEntry, Record};
pub use store::{LogStore, SharedStore, StoreError};
pub use stream::{DEFAULT_STREAM, StreamName, StreamNameError};

/// Current wall clock in milliseconds since the Unix epoch, clamped at zero.
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
