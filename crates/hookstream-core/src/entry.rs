// ABOUTME: Log entry types: the store-assigned EntryId, the opaque Record, and LogEntry.
// ABOUTME: EntryId uses the `<ms>-<seq>` stream id format and orders by (ms, seq).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors from parsing an entry id string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryIdError {
    #[error("entry id must look like <ms>-<seq>, got {0:?}")]
    Malformed(String),

    #[error("entry id part is not an unsigned integer: {0:?}")]
    InvalidPart(String),
}

/// Store-assigned identifier of a log entry.
///
/// Ids are totally ordered by milliseconds first, then sequence. Every id
/// handed out for a stream is strictly greater than the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId {
    pub ms: u64,
    pub seq: u64,
}

impl EntryId {
    pub const MIN: EntryId = EntryId { ms: 0, seq: 0 };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Compute the id that follows `last` given the current wall clock.
    ///
    /// Never goes backwards: if the clock is behind `last.ms` the
    /// milliseconds are held and the sequence advances.
    pub fn next_after(last: Option<EntryId>, now_ms: u64) -> EntryId {
        match last {
            None => EntryId::new(now_ms, 0),
            Some(last) if now_ms > last.ms => EntryId::new(now_ms, 0),
            Some(last) => match last.seq.checked_add(1) {
                Some(seq) => EntryId::new(last.ms, seq),
                None => EntryId::new(last.ms + 1, 0),
            },
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for EntryId {
    type Err = EntryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ms, seq) = s
            .split_once('-')
            .ok_or_else(|| EntryIdError::Malformed(s.to_string()))?;
        let parse = |part: &str| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(EntryIdError::InvalidPart(part.to_string()));
            }
            part.parse::<u64>()
                .map_err(|_| EntryIdError::InvalidPart(part.to_string()))
        };
        Ok(EntryId::new(parse(ms)?, parse(seq)?))
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An opaque payload submitted by a caller. The core never looks inside,
/// and the bytes are stored exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record(Vec<u8>);

impl Record {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// One `(field, value)` pair of a log entry.
pub type Field = (String, Vec<u8>);

/// A record as stored in the log, tagged with its assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: EntryId,
    pub fields: Vec<Field>,
}

impl LogEntry {
    /// Value of the first field with the given name.
    pub fn field(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Decode the named field as JSON.
    pub fn json_field(&self, name: &str) -> Option<Result<serde_json::Value, serde_json::Error>> {
        self.field(name).map(serde_json::from_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_parses_and_displays() {
        let id: EntryId = "1526919030474-55".parse().unwrap();
        assert_eq!(id, EntryId::new(1526919030474, 55));
        assert_eq!(id.to_string(), "1526919030474-55");
    }

    #[test]
    fn entry_id_rejects_malformed() {
        assert!(matches!(
            "12345".parse::<EntryId>(),
            Err(EntryIdError::Malformed(_))
        ));
        assert!(matches!(
            "12-".parse::<EntryId>(),
            Err(EntryIdError::InvalidPart(_))
        ));
        assert!(matches!(
            "12-+3".parse::<EntryId>(),
            Err(EntryIdError::InvalidPart(_))
        ));
        assert!(matches!(
            "a-1".parse::<EntryId>(),
            Err(EntryIdError::InvalidPart(_))
        ));
        assert!("1-2-3".parse::<EntryId>().is_err());
    }

    #[test]
    fn entry_id_orders_by_ms_then_seq() {
        assert!(EntryId::new(1, 9) < EntryId::new(2, 0));
        assert!(EntryId::new(2, 0) < EntryId::new(2, 1));
        assert!(EntryId::MIN < EntryId::new(0, 1));
    }

    #[test]
    fn next_after_advances_with_clock() {
        let first = EntryId::next_after(None, 100);
        assert_eq!(first, EntryId::new(100, 0));
        assert_eq!(EntryId::next_after(Some(first), 105), EntryId::new(105, 0));
    }

    #[test]
    fn next_after_holds_ms_when_clock_stalls_or_rewinds() {
        let last = EntryId::new(100, 3);
        assert_eq!(EntryId::next_after(Some(last), 100), EntryId::new(100, 4));
        assert_eq!(EntryId::next_after(Some(last), 42), EntryId::new(100, 4));
    }

    #[test]
    fn next_after_rolls_over_exhausted_sequence() {
        let last = EntryId::new(100, u64::MAX);
        assert_eq!(EntryId::next_after(Some(last), 100), EntryId::new(101, 0));
    }

    #[test]
    fn entry_id_serializes_as_string() {
        let json = serde_json::to_string(&EntryId::new(7, 1)).unwrap();
        assert_eq!(json, "\"7-1\"");
        let back: EntryId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntryId::new(7, 1));
    }

    #[test]
    fn log_entry_decodes_json_field() {
        let record = Record::from_bytes(br#"{"event":"click"}"#.to_vec());

        let entry = LogEntry {
            id: EntryId::new(1, 0),
            fields: vec![("data".to_string(), record.into_bytes())],
        };

        let decoded = entry.json_field("data").unwrap().unwrap();
        assert_eq!(decoded, serde_json::json!({ "event": "click" }));
        assert!(entry.field("missing").is_none());
    }

    #[test]
    fn record_keeps_bytes_verbatim() {
        let body = br#"{"zeta":1, "alpha":123456789012345678901234567890}"#;
        let record = Record::from_bytes(body.to_vec());
        assert_eq!(record.as_bytes(), body);
        assert_eq!(record.into_bytes(), body.to_vec());
    }
}
