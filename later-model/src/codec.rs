//! JSON codec for the persisted task collection blob.
//!
//! The cache holds one blob under a fixed key: a JSON object mapping day
//! strings to task lists, the same shape the collection has in memory.
//! Encoding is strict (we wrote the data); decoding is deliberately loose —
//! a malformed entry is skipped, never allowed to fail the whole load.

use std::collections::HashMap;

use serde_json::Value;

use crate::day::DayKey;
use crate::record::RawTaskRecord;
use crate::task::TaskBook;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// The loosely-decoded cache blob: raw records per day, plus a count of
/// entries that could not even be read as records.
#[derive(Debug, Default)]
pub struct DecodedBook {
    /// Raw records bucketed by day, in stored order.
    pub days: HashMap<DayKey, Vec<RawTaskRecord>>,
    /// Entries dropped during decoding (unparsable day key or record).
    pub skipped: usize,
}

impl DecodedBook {
    /// Runs every record through validation, using its bucket day as the
    /// fallback. Returns the typed collection and the total number of
    /// records dropped (decode skips plus validation rejects).
    #[must_use]
    pub fn into_tasks(self) -> (TaskBook, usize) {
        let mut book = TaskBook::new();
        let mut skipped = self.skipped;
        for (day, records) in self.days {
            for record in records {
                match record.validate(day) {
                    // Cache records carry no date field, so validation
                    // cannot re-bucket them away from their key.
                    Some((task_day, task)) => book.entry(task_day).or_default().push(task),
                    None => skipped += 1,
                }
            }
        }
        (book, skipped)
    }
}

/// Encodes the in-memory collection into the JSON cache blob.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the collection cannot be
/// serialized.
pub fn encode_book(book: &TaskBook) -> Result<String, CodecError> {
    serde_json::to_string(book).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a JSON cache blob into raw per-day records.
///
/// Only a blob that is not a JSON object at the top level is an error;
/// individual malformed day keys or records are counted and skipped.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the blob is not a JSON object
/// of arrays.
pub fn decode_book(blob: &str) -> Result<DecodedBook, CodecError> {
    let raw: HashMap<String, Vec<Value>> =
        serde_json::from_str(blob).map_err(|e| CodecError::Serialization(e.to_string()))?;

    let mut decoded = DecodedBook::default();
    for (key, values) in raw {
        let Ok(day) = DayKey::parse(&key) else {
            decoded.skipped += values.len();
            continue;
        };
        let bucket: &mut Vec<RawTaskRecord> = decoded.days.entry(day).or_default();
        for value in values {
            match serde_json::from_value::<RawTaskRecord>(value) {
                Ok(record) => bucket.push(record),
                Err(_) => decoded.skipped += 1,
            }
        }
    }
    Ok(decoded)
}
