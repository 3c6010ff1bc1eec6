//! End-to-end sync cycle tests for quill-client
//!
//! These tests wire a reconciler to in-memory gateway fakes and run full
//! push/pull/merge cycles, including polling on a paused clock. The
//! fakes are held behind `Arc` so the tests can inspect and reconfigure
//! them while the reconciler owns its clone.

use quill_client::{
    Notifier, NullNotifier, PersistenceGateway, Reconciler, RemoteGateway, Result, SyncConfig,
    SyncError, SyncPoller, SyncReport,
};
use quill_engine::{ConflictRecord, Record, RecordId, RemoteRecord};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct FakeRemote {
    snapshot: Mutex<Vec<RemoteRecord>>,
    offline: AtomicBool,
    pull_failing: AtomicBool,
    pushed: Mutex<Vec<Record>>,
    fetch_calls: AtomicU64,
    next_id: AtomicU64,
}

impl FakeRemote {
    fn with_snapshot(snapshot: Vec<RemoteRecord>) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(snapshot),
            ..Self::default()
        })
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Pushes keep succeeding; only the pull fails.
    fn set_pull_failing(&self, failing: bool) {
        self.pull_failing.store(failing, Ordering::Relaxed);
    }

    fn fetches(&self) -> u64 {
        self.fetch_calls.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl RemoteGateway for FakeRemote {
    async fn fetch_remote(&self, limit: usize) -> Result<Vec<RemoteRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if self.offline.load(Ordering::Relaxed) || self.pull_failing.load(Ordering::Relaxed) {
            return Err(SyncError::RemoteUnavailable("offline".into()));
        }
        let snapshot = self.snapshot.lock().unwrap();
        Ok(snapshot.iter().take(limit).cloned().collect())
    }

    async fn push_record(&self, record: &Record) -> Result<RecordId> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(SyncError::PushRejected {
                id: record.id.clone(),
                reason: "offline".into(),
            });
        }
        self.pushed.lock().unwrap().push(record.clone());
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("srv-{n}");
        // The server also starts returning what it accepted
        self.snapshot.lock().unwrap().push(RemoteRecord::new(
            id.clone(),
            record.text.clone(),
            record.category.clone(),
        ));
        Ok(id)
    }
}

#[derive(Default)]
struct FakeDisk {
    slot: Mutex<Option<Vec<Record>>>,
    conflict_slot: Mutex<Option<Vec<ConflictRecord>>>,
}

impl FakeDisk {
    fn seeded(records: Vec<Record>) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Some(records)),
            ..Self::default()
        })
    }
}

#[async_trait::async_trait]
impl PersistenceGateway for FakeDisk {
    async fn load_all(&self) -> Result<Option<Vec<Record>>> {
        Ok(self.slot.lock().unwrap().clone())
    }

    async fn save_all(&self, records: &[Record]) -> Result<()> {
        *self.slot.lock().unwrap() = Some(records.to_vec());
        Ok(())
    }

    async fn load_conflicts(&self) -> Result<Option<Vec<ConflictRecord>>> {
        Ok(self.conflict_slot.lock().unwrap().clone())
    }

    async fn save_conflicts(&self, conflicts: &[ConflictRecord]) -> Result<()> {
        *self.conflict_slot.lock().unwrap() = Some(conflicts.to_vec());
        Ok(())
    }
}

#[derive(Default)]
struct CapturingNotifier {
    reports: Mutex<Vec<SyncReport>>,
    conflicts: Mutex<Vec<ConflictRecord>>,
}

impl Notifier for CapturingNotifier {
    fn on_sync_result(&self, report: &SyncReport) {
        self.reports.lock().unwrap().push(*report);
    }

    fn on_conflicts(&self, conflicts: &[ConflictRecord]) {
        self.conflicts.lock().unwrap().extend_from_slice(conflicts);
    }
}

// ============================================================================
// Full Cycle Scenarios
// ============================================================================

#[tokio::test]
async fn first_sync_of_a_fresh_client() {
    let remote = FakeRemote::with_snapshot(vec![
        RemoteRecord::new("srv-a", "Quote A", "life"),
        RemoteRecord::new("srv-b", "Quote B", "work"),
    ]);
    let reconciler = Reconciler::new(remote, Arc::new(FakeDisk::default()), NullNotifier);
    reconciler.load().await.unwrap();

    let report = reconciler.sync_once().await.unwrap();

    assert_eq!(
        report,
        SyncReport {
            pushed: 0,
            push_failed: 0,
            upserted: 2,
            conflicts: 0,
            failed: false,
        }
    );
    assert!(report.is_clean());
    assert_eq!(reconciler.records().len(), 2);
    assert_eq!(reconciler.dirty_count(), 0);
}

#[tokio::test]
async fn local_quote_round_trips_through_the_server() {
    let remote = FakeRemote::with_snapshot(vec![]);
    let disk = Arc::new(FakeDisk::default());
    let reconciler = Reconciler::new(Arc::clone(&remote), Arc::clone(&disk), NullNotifier);

    let local_id = reconciler.add_quote("Fresh thought", "ideas").await.unwrap();
    let report = reconciler.sync_once().await.unwrap();

    assert_eq!(report.pushed, 1);
    assert_eq!(report.upserted, 1, "pushed record comes back in the pull");
    assert_eq!(reconciler.dirty_count(), 0);
    assert!(reconciler.find(&local_id).is_none());

    // It now lives under the server identity with the same content
    let record = reconciler.find("srv-0").unwrap();
    assert_eq!(record.text, "Fresh thought");
    assert!(!record.dirty);

    // And the final state reached durable storage
    let saved = disk.slot.lock().unwrap().clone().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, "srv-0");
}

#[tokio::test]
async fn offline_cycle_then_recovery() {
    let remote = FakeRemote::with_snapshot(vec![RemoteRecord::new("srv-a", "A", "")]);
    remote.set_offline(true);
    let notifier = Arc::new(CapturingNotifier::default());
    let reconciler = Reconciler::new(Arc::clone(&remote), Arc::new(FakeDisk::default()), Arc::clone(&notifier));
    reconciler.add_quote("written offline", "").await.unwrap();

    let offline_report = reconciler.sync_once().await.unwrap();

    assert!(offline_report.failed);
    assert_eq!(offline_report.push_failed, 1);
    assert_eq!(reconciler.dirty_count(), 1, "nothing lost while offline");
    assert!(reconciler.records()[0].dirty);
    assert!(notifier.reports.lock().unwrap()[0].failed);

    remote.set_offline(false);
    let report = reconciler.sync_once().await.unwrap();

    assert!(!report.failed);
    assert_eq!(report.pushed, 1);
    assert_eq!(reconciler.dirty_count(), 0);
    // Both the pre-existing server record and the recovered push are present
    assert!(reconciler.find("srv-a").is_some());
    assert!(reconciler.find("srv-0").is_some());
}

#[tokio::test]
async fn conflict_workflow_reported_and_restored() {
    // Another client's edit reached the server; this client holds a clean
    // older copy and pulls.
    let remote = FakeRemote::with_snapshot(vec![RemoteRecord::new("srv-a", "their wording", "X")]);
    let notifier = Arc::new(CapturingNotifier::default());
    let mut stale = Record::local("srv-a", "our wording", "X", 1_000);
    stale.dirty = false;
    let disk = FakeDisk::seeded(vec![stale]);
    let reconciler = Reconciler::new(Arc::clone(&remote), disk, Arc::clone(&notifier));
    reconciler.load().await.unwrap();

    let report = reconciler.sync_once().await.unwrap();

    // Server wins, conflict captured and surfaced before the report
    assert_eq!(report.conflicts, 1);
    assert_eq!(reconciler.find("srv-a").unwrap().text, "their wording");
    let surfaced = notifier.conflicts.lock().unwrap().clone();
    assert_eq!(surfaced.len(), 1);
    assert_eq!(surfaced[0].local_snapshot.text, "our wording");
    assert_eq!(surfaced[0].server_version.text, "their wording");

    // The user disagrees and restores, which re-enters the push path
    let conflict = reconciler.conflict_log()[0].clone();
    reconciler.restore_local(&conflict).await.unwrap();
    let restored = reconciler.find("srv-a").unwrap();
    assert!(restored.dirty);
    assert_eq!(restored.text, "our wording");

    let report = reconciler.sync_once().await.unwrap();
    assert_eq!(report.pushed, 1);
    assert_eq!(remote.pushed.lock().unwrap().last().unwrap().text, "our wording");
}

#[tokio::test]
async fn restart_after_failed_pull_does_not_repush() {
    // Push succeeds, pull fails, client restarts: the acknowledged record
    // must come back clean under its server id, not as a dirty duplicate.
    let remote = FakeRemote::with_snapshot(vec![]);
    let disk = Arc::new(FakeDisk::default());
    let reconciler = Reconciler::new(Arc::clone(&remote), Arc::clone(&disk), NullNotifier);
    reconciler.add_quote("one-shot", "").await.unwrap();

    remote.set_pull_failing(true);
    let report = reconciler.sync_once().await.unwrap();
    assert!(report.failed);
    assert_eq!(report.pushed, 1);
    assert_eq!(remote.pushed.lock().unwrap().len(), 1);

    // Restart: fresh client over the same disk and server
    remote.set_pull_failing(false);
    let restarted = Reconciler::new(Arc::clone(&remote), disk, NullNotifier);
    restarted.load().await.unwrap();
    assert_eq!(restarted.dirty_count(), 0);
    assert!(restarted.find("srv-0").is_some());

    let report = restarted.sync_once().await.unwrap();
    assert_eq!(report.pushed, 0);
    assert_eq!(
        remote.pushed.lock().unwrap().len(),
        1,
        "acknowledged record must not be pushed a second time"
    );
}

#[tokio::test]
async fn conflict_log_survives_restart() {
    let remote = FakeRemote::with_snapshot(vec![RemoteRecord::new("srv-a", "their wording", "X")]);
    let mut stale = Record::local("srv-a", "our wording", "X", 1_000);
    stale.dirty = false;
    let disk = FakeDisk::seeded(vec![stale]);
    let reconciler = Reconciler::new(Arc::clone(&remote), Arc::clone(&disk), NullNotifier);
    reconciler.load().await.unwrap();
    let report = reconciler.sync_once().await.unwrap();
    assert_eq!(report.conflicts, 1);

    // Restart: the captured conflict is still available for manual review
    let restarted = Reconciler::new(Arc::clone(&remote), disk, NullNotifier);
    restarted.load().await.unwrap();
    let log = restarted.conflict_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].local_snapshot.text, "our wording");

    restarted.restore_local(&log[0]).await.unwrap();
    assert!(restarted.find("srv-a").unwrap().dirty);
}

#[tokio::test]
async fn clean_merge_does_not_notify_conflicts() {
    let remote = FakeRemote::with_snapshot(vec![RemoteRecord::new("srv-a", "A", "")]);
    let notifier = Arc::new(CapturingNotifier::default());
    let reconciler = Reconciler::new(remote, Arc::new(FakeDisk::default()), Arc::clone(&notifier));

    reconciler.sync_once().await.unwrap();

    assert!(notifier.conflicts.lock().unwrap().is_empty());
    assert_eq!(notifier.reports.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn fetch_limit_caps_the_pull() {
    let snapshot: Vec<_> = (0..50)
        .map(|i| RemoteRecord::new(format!("srv-{i}"), format!("quote {i}"), ""))
        .collect();
    let reconciler = Reconciler::with_config(
        FakeRemote::with_snapshot(snapshot),
        Arc::new(FakeDisk::default()),
        NullNotifier,
        SyncConfig { fetch_limit: 10 },
    );

    let report = reconciler.sync_once().await.unwrap();

    assert_eq!(report.upserted, 10);
    assert_eq!(reconciler.records().len(), 10);
}

// ============================================================================
// Polling
// ============================================================================

async fn settle() {
    // Let the spawned polling task run its pending tick to completion
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn poller_fires_immediately_then_on_interval() {
    let remote = FakeRemote::with_snapshot(vec![]);
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&remote),
        Arc::new(FakeDisk::default()),
        NullNotifier,
    ));
    let mut poller = SyncPoller::new(Arc::clone(&reconciler));

    poller.start(Duration::from_secs(30));
    settle().await;
    assert_eq!(remote.fetches(), 1, "first cycle fires without waiting a full interval");

    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(remote.fetches(), 2);

    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(remote.fetches(), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_halts_and_restart_replaces() {
    let remote = FakeRemote::with_snapshot(vec![]);
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&remote),
        Arc::new(FakeDisk::default()),
        NullNotifier,
    ));
    let mut poller = SyncPoller::new(Arc::clone(&reconciler));

    poller.start(Duration::from_secs(30));
    settle().await;
    assert!(poller.is_running());
    let before = remote.fetches();

    poller.stop();
    assert!(!poller.is_running());
    tokio::time::advance(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(remote.fetches(), before, "no cycles after stop");

    // Restarting twice leaves exactly one schedule active
    poller.start(Duration::from_secs(10));
    poller.start(Duration::from_secs(10));
    settle().await;
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    // One immediate tick from the surviving schedule plus one interval tick
    assert_eq!(remote.fetches(), before + 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_poller_stops_polling() {
    let remote = FakeRemote::with_snapshot(vec![]);
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&remote),
        Arc::new(FakeDisk::default()),
        NullNotifier,
    ));

    {
        let mut poller = SyncPoller::new(Arc::clone(&reconciler));
        poller.start(Duration::from_secs(5));
        settle().await;
    }

    let before = remote.fetches();
    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(remote.fetches(), before);
}
