//! Server-wins merge of a pulled remote snapshot into the local store.
//!
//! This is the core of determinism. Given the full remote record set and
//! the current store, the merge produces the same result every time.
//!
//! # Algorithm
//!
//! For each remote record, in snapshot order:
//!
//! 1. Id absent locally: insert as-is (remote origin, clean).
//! 2. Present with equal `text`/`category`: clear the dirty flag, no
//!    conflict.
//! 3. Present with any compared field differing: capture the local
//!    pre-merge state as a conflict, then overwrite every field except
//!    the id with the server's values.
//!
//! The server wins unconditionally. There is no timestamp comparison and
//! no three-way merge; `updated_at` is bookkeeping only and never feeds
//! the decision. A lost local edit can only reassert itself through
//! [`restore_snapshot`], which marks it dirty for the next push.

use crate::{Origin, Record, RecordId, RecordStore, RemoteRecord, Timestamp};
use serde::{Deserialize, Serialize};

/// A conflict captured at merge time, before the server overwrite.
///
/// Appended to a durable conflict log and consumed by the notifier or the
/// manual-override path. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    /// The shared record id
    pub id: RecordId,
    /// The server's version, which won
    pub server_version: RemoteRecord,
    /// The local record exactly as it was before the overwrite
    pub local_snapshot: Record,
}

/// Result of one merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Remote records that caused a write (insert or conflict overwrite)
    pub upserted: usize,
    /// Conflicts captured during this pass
    pub conflicts: Vec<ConflictRecord>,
}

impl MergeReport {
    /// Number of conflicts captured.
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// True if the pass produced no conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Merge the full remote snapshot into the store, server-wins.
///
/// Deterministic upsert keyed by id, processed in snapshot order. `now`
/// stamps every written record; records that only have their dirty flag
/// cleared keep their timestamp.
pub fn merge_remote(store: &mut RecordStore, remote: &[RemoteRecord], now: Timestamp) -> MergeReport {
    let mut report = MergeReport::default();

    for sq in remote {
        if !store.contains(&sq.id) {
            store.upsert(Record::from_remote(sq, now));
            report.upserted += 1;
            continue;
        }

        // Lookup cannot fail after the contains check
        let Some(local) = store.find_mut(&sq.id) else {
            continue;
        };

        if local.content_matches(sq) {
            // Same content on both sides: the remote has this record, so a
            // pending push for it is moot.
            local.dirty = false;
            local.origin = Origin::Remote;
        } else {
            let local_snapshot = local.clone();
            local.overwrite_from(sq, now);
            report.conflicts.push(ConflictRecord {
                id: sq.id.clone(),
                server_version: sq.clone(),
                local_snapshot,
            });
            report.upserted += 1;
        }
    }

    report
}

/// Manual override: put the losing local version back, marked dirty so it
/// is pushed on the next cycle.
pub fn restore_snapshot(store: &mut RecordStore, conflict: &ConflictRecord, now: Timestamp) {
    let mut record = conflict.local_snapshot.clone();
    record.dirty = true;
    record.origin = Origin::Local;
    record.updated_at = now;
    store.upsert(record);
}
