//! Record types for the quote store.

use crate::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

/// Provenance of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Created or last rewritten locally
    Local,
    /// Received from the remote side
    Remote,
}

/// A quote record as held by the store and the persistence gateway.
///
/// Serialized as a flat object with camelCase keys
/// (`id, text, category, dirty, origin, updatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier, namespaced by origin (`local-...` / `remote-...`)
    pub id: RecordId,
    /// The quote body, never empty
    pub text: String,
    /// Category used for filtering/display, possibly empty
    pub category: String,
    /// True if modified locally and not yet acknowledged by the remote
    pub dirty: bool,
    /// Provenance, informational only
    pub origin: Origin,
    /// Client-assigned timestamp of the last mutation (milliseconds since epoch)
    pub updated_at: Timestamp,
}

/// The wire shape exchanged with the remote gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    /// Server-side identifier
    pub id: RecordId,
    /// The quote body
    pub text: String,
    /// Category
    pub category: String,
}

impl Record {
    /// Create a record for a local user action. Dirty until acknowledged.
    pub fn local(
        id: impl Into<RecordId>,
        text: impl Into<String>,
        category: impl Into<String>,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category: category.into(),
            dirty: true,
            origin: Origin::Local,
            updated_at,
        }
    }

    /// Create a record from a pulled remote snapshot entry.
    pub fn from_remote(remote: &RemoteRecord, updated_at: Timestamp) -> Self {
        Self {
            id: remote.id.clone(),
            text: remote.text.clone(),
            category: remote.category.clone(),
            dirty: false,
            origin: Origin::Remote,
            updated_at,
        }
    }

    /// Compare the merge-relevant fields (`text`, `category`) against a
    /// remote record. Identity and bookkeeping fields are ignored.
    pub fn content_matches(&self, remote: &RemoteRecord) -> bool {
        self.text == remote.text && self.category == remote.category
    }

    /// Overwrite the compared fields with the server's values and mark the
    /// record as remote-acknowledged. The id is never touched.
    pub fn overwrite_from(&mut self, remote: &RemoteRecord, updated_at: Timestamp) {
        self.text = remote.text.clone();
        self.category = remote.category.clone();
        self.dirty = false;
        self.origin = Origin::Remote;
        self.updated_at = updated_at;
    }
}

impl RemoteRecord {
    /// Create a remote record.
    pub fn new(
        id: impl Into<RecordId>,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category: category.into(),
        }
    }
}
