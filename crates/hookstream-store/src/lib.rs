// ABOUTME: Ordered-log backends for hookstream: Redis Streams in production, SQLite and memory otherwise.
// ABOUTME: Every backend implements hookstream_core::LogStore; connect() picks one from a StoreConfig.

pub mod connect;
pub mod memory;
pub mod redis_log;
pub mod sqlite;

pub use connect::{ConnectError, StoreConfig, StoreKind, connect};
pub use memory::MemoryLog;
pub use redis_log::{RedisLog, RedisSettings, TlsFiles};
pub use sqlite::SqliteLog;
