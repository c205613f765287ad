// ABOUTME: In-process LogStore backed by a mutex-guarded map of vectors.
// ABOUTME: Not durable. Appends are serialized by the mutex, so ids are totally ordered per stream.

use std::collections::HashMap;

use async_trait::async_trait;
use hookstream_core::{EntryId, Field, LogEntry, LogStore, StoreError, StreamName, now_ms};
use tokio::sync::Mutex;

/// A LogStore that keeps every stream in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    streams: Mutex<HashMap<StreamName, Vec<LogEntry>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStore for MemoryLog {
    async fn append(&self, stream: &StreamName, fields: &[Field]) -> Result<EntryId, StoreError> {
        let mut streams = self.streams.lock().await;
        let entries = streams.entry(stream.clone()).or_default();
        let id = EntryId::next_after(entries.last().map(|e| e.id), now_ms());
        entries.push(LogEntry {
            id,
            fields: fields.to_vec(),
        });
        Ok(id)
    }

    async fn len(&self, stream: &StreamName) -> Result<u64, StoreError> {
        let streams = self.streams.lock().await;
        Ok(streams.get(stream).map_or(0, |entries| entries.len() as u64))
    }

    async fn range(
        &self,
        stream: &StreamName,
        after: Option<EntryId>,
        count: usize,
    ) -> Result<Vec<LogEntry>, StoreError> {
        let streams = self.streams.lock().await;
        let Some(entries) = streams.get(stream) else {
            return Ok(Vec::new());
        };

        // Entries are sorted by id, so the first one past `after` is a partition point.
        let start = match after {
            Some(after) => entries.partition_point(|e| e.id <= after),
            None => 0,
        };
        Ok(entries[start..].iter().take(count).cloned().collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
