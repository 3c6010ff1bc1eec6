//! Gateway traits for the external collaborators.
//!
//! The reconciler talks to durable storage, the remote service, and the
//! presentation layer exclusively through these seams. Implementations
//! live with the embedding application (a browser shell, a desktop app, a
//! test harness); the sync core never performs IO of its own.

use crate::error::Result;
use crate::reconciler::SyncReport;
use async_trait::async_trait;
use quill_engine::{ConflictRecord, Record, RecordId, RemoteRecord};

/// Durable storage for the record list and the conflict log.
///
/// Each slot is always written whole; there is no partial update path
/// and no migration concern at this layer.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Load the persisted record list, or `None` if the slot is empty.
    async fn load_all(&self) -> Result<Option<Vec<Record>>>;

    /// Replace the persisted record list.
    async fn save_all(&self, records: &[Record]) -> Result<()>;

    /// Load the persisted conflict log, or `None` if the slot is empty.
    async fn load_conflicts(&self) -> Result<Option<Vec<ConflictRecord>>>;

    /// Replace the persisted conflict log.
    async fn save_conflicts(&self, conflicts: &[ConflictRecord]) -> Result<()>;
}

/// The remote service, abstracted over any transport.
///
/// Timeouts, retries below the per-cycle level, and encoding are the
/// implementor's concern.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Pull the full remote record snapshot (not a delta).
    async fn fetch_remote(&self, limit: usize) -> Result<Vec<RemoteRecord>>;

    /// Push one locally dirty record. Returns the server-assigned
    /// identity, which may differ from the record's current id.
    async fn push_record(&self, record: &Record) -> Result<RecordId>;
}

/// Presentation-layer callback for sync outcomes.
pub trait Notifier: Send + Sync {
    /// Called once per completed or failed cycle with its counts.
    fn on_sync_result(&self, report: &SyncReport);

    /// Called with the conflicts captured during a merge, before
    /// `on_sync_result`. Not called when the merge was clean.
    fn on_conflicts(&self, conflicts: &[ConflictRecord]);
}

/// A notifier that discards every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn on_sync_result(&self, _report: &SyncReport) {}
    fn on_conflicts(&self, _conflicts: &[ConflictRecord]) {}
}

// Shared-ownership forwarding, so one gateway instance can serve both
// the reconciler and an observer (a UI handle, a test harness).

#[async_trait]
impl<T: PersistenceGateway + ?Sized> PersistenceGateway for std::sync::Arc<T> {
    async fn load_all(&self) -> Result<Option<Vec<Record>>> {
        (**self).load_all().await
    }

    async fn save_all(&self, records: &[Record]) -> Result<()> {
        (**self).save_all(records).await
    }

    async fn load_conflicts(&self) -> Result<Option<Vec<ConflictRecord>>> {
        (**self).load_conflicts().await
    }

    async fn save_conflicts(&self, conflicts: &[ConflictRecord]) -> Result<()> {
        (**self).save_conflicts(conflicts).await
    }
}

#[async_trait]
impl<T: RemoteGateway + ?Sized> RemoteGateway for std::sync::Arc<T> {
    async fn fetch_remote(&self, limit: usize) -> Result<Vec<RemoteRecord>> {
        (**self).fetch_remote(limit).await
    }

    async fn push_record(&self, record: &Record) -> Result<RecordId> {
        (**self).push_record(record).await
    }
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn on_sync_result(&self, report: &SyncReport) {
        (**self).on_sync_result(report)
    }

    fn on_conflicts(&self, conflicts: &[ConflictRecord]) {
        (**self).on_conflicts(conflicts)
    }
}
