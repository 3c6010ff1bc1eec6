//! Interval-driven sync triggering.
//!
//! The poller owns a background task that fires `sync_once` on a fixed
//! cadence. Triggers that land while a cycle is still running are
//! absorbed by the reconciler's in-flight guard, so a slow remote never
//! queues up a backlog of cycles.

use crate::gateway::{Notifier, PersistenceGateway, RemoteGateway};
use crate::reconciler::Reconciler;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Drives periodic sync cycles on a shared reconciler.
pub struct SyncPoller<R, P, N> {
    reconciler: Arc<Reconciler<R, P, N>>,
    task: Option<JoinHandle<()>>,
}

impl<R, P, N> SyncPoller<R, P, N>
where
    R: RemoteGateway + 'static,
    P: PersistenceGateway + 'static,
    N: Notifier + 'static,
{
    /// Create a poller over a shared reconciler. Polling does not start
    /// until [`start`](Self::start) is called.
    pub fn new(reconciler: Arc<Reconciler<R, P, N>>) -> Self {
        Self {
            reconciler,
            task: None,
        }
    }

    /// Begin polling at the given interval. The first cycle runs
    /// immediately, then one per interval. Starting an already-running
    /// poller replaces the schedule; the old task is stopped first.
    pub fn start(&mut self, interval: Duration) {
        self.stop();
        let reconciler = Arc::clone(&self.reconciler);
        tracing::info!(?interval, "polling started");
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                reconciler.sync_once().await;
            }
        }));
    }

    /// Halt polling. In-memory state is kept; a later `start` resumes
    /// from it. Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("polling stopped");
        }
    }

    /// Whether a polling task is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// The reconciler this poller drives.
    pub fn reconciler(&self) -> &Arc<Reconciler<R, P, N>> {
        &self.reconciler
    }
}

impl<R, P, N> Drop for SyncPoller<R, P, N> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
