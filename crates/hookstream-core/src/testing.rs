// ABOUTME: Test doubles for LogStore: a store that is always down and one that never answers in time.
// ABOUTME: Used by server tests to exercise the upstream-error and timeout paths without a real store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::entry::{EntryId, Field, LogEntry};
use crate::store::{LogStore, StoreError};
use crate::stream::StreamName;

/// A store whose every call fails with `StoreError::Unavailable`.
///
/// Counts append attempts so tests can check that a request tried the
/// store at most once.
#[derive(Debug, Default)]
pub struct UnavailableLog {
    attempts: AtomicUsize,
}

impl UnavailableLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `append` has been called.
    pub fn append_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn down() -> StoreError {
        StoreError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl LogStore for UnavailableLog {
    async fn append(&self, _stream: &StreamName, _fields: &[Field]) -> Result<EntryId, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Self::down())
    }

    async fn len(&self, _stream: &StreamName) -> Result<u64, StoreError> {
        Err(Self::down())
    }

    async fn range(
        &self,
        _stream: &StreamName,
        _after: Option<EntryId>,
        _count: usize,
    ) -> Result<Vec<LogEntry>, StoreError> {
        Err(Self::down())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(Self::down())
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}

/// A store that sleeps for `delay` before answering any call.
#[derive(Debug)]
pub struct StallingLog {
    delay: Duration,
}

impl StallingLog {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl LogStore for StallingLog {
    async fn append(&self, _stream: &StreamName, _fields: &[Field]) -> Result<EntryId, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(EntryId::MIN)
    }

    async fn len(&self, _stream: &StreamName) -> Result<u64, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(0)
    }

    async fn range(
        &self,
        _stream: &StreamName,
        _after: Option<EntryId>,
        _count: usize,
    ) -> Result<Vec<LogEntry>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "stalling"
    }
}
