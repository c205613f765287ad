// ABOUTME: Redis Streams LogStore: XADD, XLEN, XRANGE, and PING over a shared ConnectionManager.
// ABOUTME: The manager multiplexes one connection across requests and reconnects after failures.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use hookstream_core::{EntryId, Field, LogEntry, LogStore, StoreError, StreamName};
use redis::aio::ConnectionManager;
use redis::streams::StreamRangeReply;
use redis::{AsyncCommands, ConnectionInfo, ErrorKind, IntoConnectionInfo, RedisError};

use crate::connect::ConnectError;

/// File locations for a TLS connection to Redis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsFiles {
    /// PEM bundle of CA certificates to trust instead of the system roots.
    pub ca_cert: Option<PathBuf>,
    /// PEM client certificate and key for mutual TLS. Both or neither.
    pub client_identity: Option<(PathBuf, PathBuf)>,
}

/// Where and how to reach Redis.
#[derive(Clone, PartialEq, Eq)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: Option<TlsFiles>,
    pub connect_timeout: Duration,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            username: None,
            password: None,
            tls: None,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tls", &self.tls)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl RedisSettings {
    /// Address for logs, without credentials.
    pub fn display_addr(&self) -> String {
        let scheme = if self.tls.is_some() { "rediss" } else { "redis" };
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("{scheme}://{host}:{}/{}", self.port, self.db)
    }

    /// Build the connection info the redis client understands.
    pub fn connection_info(&self) -> Result<ConnectionInfo, ConnectError> {
        let mut info = self.display_addr().as_str().into_connection_info()?;
        info.redis.db = self.db;
        info.redis.username = self.username.clone();
        info.redis.password = self.password.clone();
        Ok(info)
    }

    fn client(&self) -> Result<redis::Client, ConnectError> {
        let info = self.connection_info()?;
        let Some(tls) = &self.tls else {
            return Ok(redis::Client::open(info)?);
        };

        let root_cert = tls.ca_cert.as_deref().map(read_pem).transpose()?;
        let client_tls = match &tls.client_identity {
            Some((cert, key)) => Some(redis::ClientTlsConfig {
                client_cert: read_pem(cert)?,
                client_key: read_pem(key)?,
            }),
            None => None,
        };

        Ok(redis::Client::build_with_tls(
            info,
            redis::TlsCertificates {
                client_tls,
                root_cert,
            },
        )?)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, ConnectError> {
    std::fs::read(path).map_err(|source| ConnectError::Certificate {
        path: path.to_path_buf(),
        source,
    })
}

fn store_error(err: RedisError) -> StoreError {
    let unreachable = err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
        || matches!(
            err.kind(),
            ErrorKind::IoError
                | ErrorKind::BusyLoadingError
                | ErrorKind::TryAgain
                | ErrorKind::ClusterDown
                | ErrorKind::MasterDown
        );

    if unreachable {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Rejected(err.to_string())
    }
}

fn corrupt(stream: &StreamName, reason: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        stream: stream.to_string(),
        reason: reason.into(),
    }
}

/// A LogStore backed by a Redis stream.
#[derive(Clone)]
pub struct RedisLog {
    conn: ConnectionManager,
    addr: String,
}

impl RedisLog {
    /// Connect and ping once so a bad address fails at startup rather than on the first request.
    pub async fn connect(settings: &RedisSettings) -> Result<Self, ConnectError> {
        let addr = settings.display_addr();
        let client = settings.client()?;

        let mut conn = tokio::time::timeout(settings.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| ConnectError::Timeout(settings.connect_timeout))??;

        let _: String = tokio::time::timeout(
            settings.connect_timeout,
            redis::cmd("PING").query_async(&mut conn),
        )
        .await
        .map_err(|_| ConnectError::Timeout(settings.connect_timeout))??;

        tracing::info!(addr = %addr, "connected to redis");
        Ok(Self { conn, addr })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl LogStore for RedisLog {
    async fn append(&self, stream: &StreamName, fields: &[Field]) -> Result<EntryId, StoreError> {
        let mut conn = self.conn.clone();
        let id: String = conn
            .xadd(stream.as_str(), "*", fields)
            .await
            .map_err(store_error)?;
        id.parse()
            .map_err(|e| corrupt(stream, format!("XADD returned {id:?}: {e}")))
    }

    async fn len(&self, stream: &StreamName) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        conn.xlen(stream.as_str()).await.map_err(store_error)
    }

    async fn range(
        &self,
        stream: &StreamName,
        after: Option<EntryId>,
        count: usize,
    ) -> Result<Vec<LogEntry>, StoreError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let start = match after {
            Some(id) => format!("({id}"),
            None => "-".to_string(),
        };

        let mut conn = self.conn.clone();
        let reply: StreamRangeReply = conn
            .xrange_count(stream.as_str(), start, "+", count)
            .await
            .map_err(store_error)?;

        reply
            .ids
            .into_iter()
            .map(|raw| -> Result<LogEntry, StoreError> {
                let id: EntryId = raw
                    .id
                    .parse()
                    .map_err(|e| corrupt(stream, format!("entry id {:?}: {e}", raw.id)))?;
                let mut fields = raw
                    .map
                    .into_iter()
                    .map(|(name, value)| {
                        redis::from_redis_value::<Vec<u8>>(&value)
                            .map(|bytes| (name.clone(), bytes))
                            .map_err(|e| corrupt(stream, format!("field {name:?} of {id}: {e}")))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                // The reply map is unordered; sort so reads are deterministic.
                fields.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(LogEntry { id, fields })
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
