// ABOUTME: Validated name of an append-only log (a stream key in the store).
// ABOUTME: Rejects empty, oversized, whitespace-bearing, or control-character names.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Longest stream name accepted, in bytes.
pub const MAX_STREAM_NAME_LEN: usize = 256;

/// Name used when no stream is configured.
pub const DEFAULT_STREAM: &str = "hooks";

/// Errors from validating a stream name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamNameError {
    #[error("stream name is empty")]
    Empty,

    #[error("stream name is longer than {MAX_STREAM_NAME_LEN} bytes")]
    TooLong,

    #[error("stream name contains whitespace or control characters: {0:?}")]
    InvalidCharacter(String),
}

/// The name of a log in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamName(String);

impl StreamName {
    pub fn new(name: impl Into<String>) -> Result<Self, StreamNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(StreamNameError::Empty);
        }
        if name.len() > MAX_STREAM_NAME_LEN {
            return Err(StreamNameError::TooLong);
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(StreamNameError::InvalidCharacter(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StreamName {
    fn default() -> Self {
        Self(DEFAULT_STREAM.to_string())
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StreamName {
    type Err = StreamNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for StreamName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
