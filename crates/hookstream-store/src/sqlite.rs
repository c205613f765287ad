// ABOUTME: SQLite-backed durable LogStore for single-node deployments without Redis.
// ABOUTME: Each append reads the stream tail and inserts the next id inside one IMMEDIATE transaction.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hookstream_core::{EntryId, Field, LogEntry, LogStore, StoreError, StreamName, now_ms};
use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior, params};

use crate::connect::ConnectError;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS entries (
        stream TEXT NOT NULL,
        ms INTEGER NOT NULL,
        seq INTEGER NOT NULL,
        PRIMARY KEY (stream, ms, seq)
    ) WITHOUT ROWID;

    CREATE TABLE IF NOT EXISTS entry_fields (
        stream TEXT NOT NULL,
        ms INTEGER NOT NULL,
        seq INTEGER NOT NULL,
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        value BLOB NOT NULL,
        PRIMARY KEY (stream, ms, seq, position),
        FOREIGN KEY (stream, ms, seq) REFERENCES entries(stream, ms, seq)
    ) WITHOUT ROWID;
";

/// A LogStore persisted in a SQLite database file.
///
/// The connection sits behind a mutex and every call runs on tokio's
/// blocking pool, so appends from concurrent requests are serialized.
pub struct SqliteLog {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteLog {
    /// Open or create a log database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, ConnectError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database. Contents vanish with the handle.
    pub fn open_in_memory() -> Result<Self, ConnectError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, ConnectError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Path of the database file, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".to_string()))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("sqlite worker failed: {e}")))?
    }
}

fn store_error(err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::DiskFull,
        ) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Rejected(err.to_string()),
    }
}

fn to_sql(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::Rejected(format!("id component {value} exceeds sqlite integer range")))
}

fn from_sql(stream: &str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt {
        stream: stream.to_string(),
        reason: format!("negative id component {value}"),
    })
}

fn append_entry(conn: &mut Connection, stream: &str, fields: &[Field]) -> Result<EntryId, StoreError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(store_error)?;

    let tail: Option<(i64, i64)> = tx
        .query_row(
            "SELECT ms, seq FROM entries WHERE stream = ?1 ORDER BY ms DESC, seq DESC LIMIT 1",
            params![stream],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(store_error)?;

    let last = match tail {
        Some((ms, seq)) => Some(EntryId::new(from_sql(stream, ms)?, from_sql(stream, seq)?)),
        None => None,
    };
    let id = EntryId::next_after(last, now_ms());
    let (ms, seq) = (to_sql(id.ms)?, to_sql(id.seq)?);

    tx.execute(
        "INSERT INTO entries (stream, ms, seq) VALUES (?1, ?2, ?3)",
        params![stream, ms, seq],
    )
    .map_err(store_error)?;

    for (position, (name, value)) in fields.iter().enumerate() {
        tx.execute(
            "INSERT INTO entry_fields (stream, ms, seq, position, name, value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![stream, ms, seq, position as i64, name, value],
        )
        .map_err(store_error)?;
    }

    tx.commit().map_err(store_error)?;
    Ok(id)
}

fn read_range(
    conn: &Connection,
    stream: &str,
    after: Option<EntryId>,
    count: usize,
) -> Result<Vec<LogEntry>, StoreError> {
    let (after_ms, after_seq) = match after {
        Some(id) => (to_sql(id.ms)?, to_sql(id.seq)?),
        None => (-1, -1),
    };
    let limit = i64::try_from(count).unwrap_or(i64::MAX);

    let mut stmt = conn
        .prepare(
            "SELECT ms, seq FROM entries
             WHERE stream = ?1 AND (ms > ?2 OR (ms = ?2 AND seq > ?3))
             ORDER BY ms ASC, seq ASC
             LIMIT ?4",
        )
        .map_err(store_error)?;
    let ids = stmt
        .query_map(params![stream, after_ms, after_seq, limit], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(store_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(store_error)?;

    let mut fields_stmt = conn
        .prepare(
            "SELECT name, value FROM entry_fields
             WHERE stream = ?1 AND ms = ?2 AND seq = ?3
             ORDER BY position ASC",
        )
        .map_err(store_error)?;

    let mut entries = Vec::with_capacity(ids.len());
    for (ms, seq) in ids {
        let fields = fields_stmt
            .query_map(params![stream, ms, seq], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })
            .map_err(store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)?;
        entries.push(LogEntry {
            id: EntryId::new(from_sql(stream, ms)?, from_sql(stream, seq)?),
            fields,
        });
    }
    Ok(entries)
}

#[async_trait]
impl LogStore for SqliteLog {
    async fn append(&self, stream: &StreamName, fields: &[Field]) -> Result<EntryId, StoreError> {
        let stream = stream.as_str().to_string();
        let fields = fields.to_vec();
        self.with_conn(move |conn| append_entry(conn, &stream, &fields))
            .await
    }

    async fn len(&self, stream: &StreamName) -> Result<u64, StoreError> {
        let stream = stream.as_str().to_string();
        self.with_conn(move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM entries WHERE stream = ?1",
                    params![stream],
                    |row| row.get(0),
                )
                .map_err(store_error)?;
            from_sql(&stream, count)
        })
        .await
    }

    async fn range(
        &self,
        stream: &StreamName,
        after: Option<EntryId>,
        count: usize,
    ) -> Result<Vec<LogEntry>, StoreError> {
        let stream = stream.as_str().to_string();
        self.with_conn(move |conn| read_range(conn, &stream, after, count))
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map(|_| ())
                .map_err(store_error)
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
