//! Persistence format for the record list.
//!
//! The persistence gateway stores the full record sequence as a flat JSON
//! array of objects (`id, text, category, dirty, origin, updatedAt`).
//! Decoding is all-or-nothing: a malformed document or a batch that
//! violates the store invariants rejects the entire import.

use crate::{error::Result, Error, Record, RecordStore};

/// Serialize the record sequence for the persistence gateway.
pub fn encode_records(records: &[Record]) -> Result<String> {
    serde_json::to_string(records).map_err(|e| Error::MalformedImport(e.to_string()))
}

/// Serialize with indentation, for debugging and export.
pub fn to_pretty_json(records: &[Record]) -> Result<String> {
    serde_json::to_string_pretty(records).map_err(|e| Error::MalformedImport(e.to_string()))
}

/// Decode a persisted record list into a validated store.
///
/// Fails with [`Error::MalformedImport`] on invalid JSON, duplicate ids,
/// or empty quote bodies; nothing is partially applied.
pub fn decode_records(json: &str) -> Result<RecordStore> {
    let records: Vec<Record> =
        serde_json::from_str(json).map_err(|e| Error::MalformedImport(e.to_string()))?;
    RecordStore::from_records(records)
}
