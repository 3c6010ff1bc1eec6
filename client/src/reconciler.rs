//! The sync cycle: push dirty records, pull the remote snapshot, merge.
//!
//! One cycle walks PUSHING -> PULLING -> MERGING and returns to idle.
//! Cycles never overlap: a trigger while a cycle is in flight is a no-op.
//! Pushes are best-effort and all-attempted - one rejected record never
//! blocks the others and never aborts the cycle. A failed pull aborts the
//! cycle before anything is merged; completed pushes from the same cycle
//! stand.

use crate::error::Result;
use crate::gateway::{Notifier, PersistenceGateway, RemoteGateway};
use futures::future::join_all;
use quill_engine::{
    merge_remote, restore_snapshot, ConflictRecord, Record, RecordId, RecordStore, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Tuning knobs for the sync cycle. Constructor-injected; there is no
/// environment or CLI surface in this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Maximum number of records requested per pull.
    pub fetch_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { fetch_limit: 10 }
    }
}

/// Counts from one completed (or aborted) sync cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Dirty records acknowledged by the remote this cycle
    pub pushed: usize,
    /// Push attempts that failed; those records stay dirty for retry
    pub push_failed: usize,
    /// Remote records written into the store (inserts + overwrites)
    pub upserted: usize,
    /// Conflicts captured during the merge
    pub conflicts: usize,
    /// True if the cycle aborted on pull or could not persist the merge
    pub failed: bool,
}

/// Store plus the append-only conflict log, guarded as one unit.
#[derive(Debug, Default)]
struct SyncState {
    store: RecordStore,
    conflict_log: Vec<ConflictRecord>,
}

/// Owns the record store and drives sync cycles against the gateways.
///
/// All store mutations funnel through this type; collaborators receive
/// data by value and never hold references into the store.
pub struct Reconciler<R, P, N> {
    state: Mutex<SyncState>,
    remote: R,
    persistence: P,
    notifier: N,
    config: SyncConfig,
    in_flight: AtomicBool,
}

fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Clears the in-flight flag when the cycle future completes or is
/// dropped mid-await (a poller task aborted during a cycle must not
/// leave the flag stuck).
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<R, P, N> Reconciler<R, P, N>
where
    R: RemoteGateway,
    P: PersistenceGateway,
    N: Notifier,
{
    /// Create a reconciler with the default configuration.
    pub fn new(remote: R, persistence: P, notifier: N) -> Self {
        Self::with_config(remote, persistence, notifier, SyncConfig::default())
    }

    /// Create a reconciler with an explicit configuration.
    pub fn with_config(remote: R, persistence: P, notifier: N, config: SyncConfig) -> Self {
        Self {
            state: Mutex::new(SyncState::default()),
            remote,
            persistence,
            notifier,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore the store and the conflict log from the persistence
    /// gateway. An absent slot yields an empty store (or log). Returns
    /// the number of records loaded.
    pub async fn load(&self) -> Result<usize> {
        let loaded = self.persistence.load_all().await?;
        let store = match loaded {
            Some(records) => RecordStore::from_records(records)?,
            None => RecordStore::new(),
        };
        let conflicts = self.persistence.load_conflicts().await?.unwrap_or_default();
        let count = store.len();
        {
            let mut state = self.state();
            state.store = store;
            state.conflict_log = conflicts;
        }
        tracing::debug!(count, "store loaded from persistence");
        Ok(count)
    }

    /// Create a new quote from a user action and persist the store.
    ///
    /// The record is born dirty under a `local-` namespaced id so it can
    /// never collide with a server-assigned identity.
    pub async fn add_quote(
        &self,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<RecordId> {
        let id = format!("local-{}", uuid::Uuid::new_v4());
        let record = Record::local(id.clone(), text, category, now_ms());
        let records = {
            let mut state = self.state();
            state.store.add(record)?;
            state.store.all().to_vec()
        };
        self.persistence.save_all(&records).await?;
        tracing::debug!(%id, "quote added");
        Ok(id)
    }

    /// Apply a local edit and persist the store. The record becomes dirty
    /// and is re-pushed on the next cycle.
    pub async fn edit_quote(
        &self,
        id: &str,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<()> {
        let records = {
            let mut state = self.state();
            state.store.edit(id, text, category, now_ms())?;
            state.store.all().to_vec()
        };
        self.persistence.save_all(&records).await?;
        Ok(())
    }

    /// The full ordered record sequence, cloned out of the store.
    pub fn records(&self) -> Vec<Record> {
        self.state().store.all().to_vec()
    }

    /// Look up one record by id.
    pub fn find(&self, id: &str) -> Option<Record> {
        self.state().store.find(id).cloned()
    }

    /// Records whose category matches, for the front end's filter.
    pub fn records_in_category(&self, category: &str) -> Vec<Record> {
        self.state()
            .store
            .all()
            .iter()
            .filter(|r| r.category == category)
            .cloned()
            .collect()
    }

    /// Distinct non-empty categories currently in the store, sorted.
    /// Records with an empty category are reachable through
    /// [`records_in_category`](Self::records_in_category) with `""` but
    /// produce no filter entry of their own.
    pub fn categories(&self) -> Vec<String> {
        let state = self.state();
        let mut categories: Vec<String> = state
            .store
            .all()
            .iter()
            .filter(|r| !r.category.is_empty())
            .map(|r| r.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Number of records awaiting acknowledgment.
    pub fn dirty_count(&self) -> usize {
        self.state().store.dirty_count()
    }

    /// The conflicts captured so far, oldest first.
    pub fn conflict_log(&self) -> Vec<ConflictRecord> {
        self.state().conflict_log.clone()
    }

    /// Manual override: put a conflict's local version back into the
    /// store, dirty, so the next cycle pushes it. This is the only path
    /// by which a local edit reasserts itself after losing a merge.
    pub async fn restore_local(&self, conflict: &ConflictRecord) -> Result<()> {
        let records = {
            let mut state = self.state();
            restore_snapshot(&mut state.store, conflict, now_ms());
            state.store.all().to_vec()
        };
        self.persistence.save_all(&records).await?;
        tracing::info!(id = %conflict.id, "local version restored, will re-push");
        Ok(())
    }

    /// Run one sync cycle. Returns `None` without touching anything if a
    /// cycle is already in flight.
    pub async fn sync_once(&self) -> Option<SyncReport> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("sync trigger ignored, cycle already in flight");
            return None;
        }

        let guard = InFlightGuard(&self.in_flight);
        let (report, conflicts) = self.run_cycle().await;
        drop(guard);

        if !conflicts.is_empty() {
            self.notifier.on_conflicts(&conflicts);
        }
        self.notifier.on_sync_result(&report);
        Some(report)
    }

    async fn run_cycle(&self) -> (SyncReport, Vec<ConflictRecord>) {
        let mut report = SyncReport::default();

        // PUSHING: fan out every dirty record; collect per-item outcomes.
        let dirty: Vec<Record> = {
            let state = self.state();
            state.store.list_dirty().into_iter().cloned().collect()
        };
        if !dirty.is_empty() {
            tracing::debug!(count = dirty.len(), "pushing dirty records");
            let remote = &self.remote;
            let outcomes = join_all(dirty.iter().map(|record| async move {
                (record.id.clone(), remote.push_record(record).await)
            }))
            .await;

            let mut state = self.state();
            for (old_id, outcome) in outcomes {
                match outcome {
                    Ok(new_id) => match state.store.acknowledge_push(&old_id, &new_id) {
                        Ok(()) => report.pushed += 1,
                        Err(err) => {
                            // Server-assigned id collided with another
                            // record; keep this one dirty for retry.
                            tracing::warn!(%old_id, %new_id, %err, "push acknowledgment not applied");
                            report.push_failed += 1;
                        }
                    },
                    Err(err) => {
                        tracing::warn!(%old_id, %err, "push failed, record stays dirty");
                        report.push_failed += 1;
                    }
                }
            }
        }

        // Persist applied acknowledgments before pulling. If the cycle
        // aborts past this point, durable storage must not resurrect an
        // already-accepted record as dirty (a reload would re-push it and
        // duplicate it server-side).
        if report.pushed > 0 {
            let records = self.state().store.all().to_vec();
            if let Err(err) = self.persistence.save_all(&records).await {
                tracing::warn!(%err, "persist after push acknowledgments failed");
                report.failed = true;
            }
        }

        // PULLING: the full remote snapshot. A failure here aborts the
        // cycle; nothing is merged and the store keeps its dirty flags.
        let snapshot = match self.remote.fetch_remote(self.config.fetch_limit).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(%err, "pull failed, cycle aborted");
                report.failed = true;
                return (report, Vec::new());
            }
        };

        // MERGING: server-wins upsert, then persist the whole store and
        // any newly captured conflicts.
        let (merge, records, conflict_log) = {
            let mut state = self.state();
            let merge = merge_remote(&mut state.store, &snapshot, now_ms());
            state.conflict_log.extend(merge.conflicts.iter().cloned());
            let records = state.store.all().to_vec();
            let conflict_log = state.conflict_log.clone();
            (merge, records, conflict_log)
        };
        report.upserted = merge.upserted;
        report.conflicts = merge.conflict_count();

        if let Err(err) = self.persistence.save_all(&records).await {
            tracing::error!(%err, "persist after merge failed");
            report.failed = true;
        }
        if !merge.conflicts.is_empty() {
            if let Err(err) = self.persistence.save_conflicts(&conflict_log).await {
                tracing::error!(%err, "persist conflict log failed");
                report.failed = true;
            }
        }

        tracing::info!(
            pushed = report.pushed,
            push_failed = report.push_failed,
            upserted = report.upserted,
            conflicts = report.conflicts,
            "sync cycle finished"
        );
        (report, merge.conflicts)
    }
}

impl SyncReport {
    /// True if the cycle completed without any per-item or cycle failure.
    pub fn is_clean(&self) -> bool {
        !self.failed && self.push_failed == 0 && self.conflicts == 0
    }
}
