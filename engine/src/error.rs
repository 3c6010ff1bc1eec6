//! Error types for the Quill engine.

use crate::RecordId;
use thiserror::Error;

/// All possible errors from the Quill engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("duplicate record id: {0}")]
    DuplicateId(RecordId),

    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("record has empty text: {0}")]
    EmptyText(RecordId),

    #[error("malformed import: {0}")]
    MalformedImport(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
