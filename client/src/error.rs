//! Unified error handling for the sync client.

use quill_engine::RecordId;
use thiserror::Error;

/// All possible failures of the sync orchestration.
///
/// Every variant is reported to the notifier collaborator; none crash the
/// polling loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The remote gateway could not serve a pull. Aborts the current
    /// cycle only; store and dirty flags are unchanged.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote gateway refused one pushed record. Recorded per item;
    /// the record stays dirty for retry and the cycle continues.
    #[error("push rejected for record '{id}': {reason}")]
    PushRejected { id: RecordId, reason: String },

    /// The persistence gateway failed to load or save the record list.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// An invariant violation surfaced by the engine.
    #[error("engine error: {0}")]
    Engine(#[from] quill_engine::Error),
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
