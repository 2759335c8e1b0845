use crate::leaderboard::LeaderboardEntry;
use crate::service::LeaderboardService;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Last successfully fetched leaderboard, shared between the poller and the UI
#[derive(Debug, Clone, Default)]
pub struct LeaderboardSnapshot {
    inner: Arc<RwLock<Option<Vec<LeaderboardEntry>>>>,
}

impl LeaderboardSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first fetch succeeds
    pub fn get(&self) -> Option<Vec<LeaderboardEntry>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        match self.inner.read() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    pub fn replace(&self, entries: Vec<LeaderboardEntry>) {
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(entries),
            Err(poisoned) => *poisoned.into_inner() = Some(entries),
        }
    }
}

/// Fetch once. A failure is logged and leaves the snapshot as it was.
pub fn refresh<S: LeaderboardService + ?Sized>(service: &S, snapshot: &LeaderboardSnapshot) -> bool {
    match service.fetch_entries() {
        Ok(entries) => {
            debug!(entries = entries.len(), "leaderboard refreshed");
            snapshot.replace(entries);
            true
        }
        Err(e) => {
            warn!(error = %e, "leaderboard refresh failed, keeping previous snapshot");
            false
        }
    }
}

/// Running refresh task. Stopped by `stop` or when dropped.
#[derive(Debug)]
pub struct PollHandle {
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Cancel the task and wait for the worker to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Refresh `snapshot` from `service` now and then every `interval`
pub fn spawn<S: LeaderboardService>(
    service: S,
    interval: Duration,
    snapshot: LeaderboardSnapshot,
) -> PollHandle {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let worker = thread::spawn(move || loop {
        refresh(&service, &snapshot);

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!("leaderboard poller stopped");
                break;
            }
        }
    });

    PollHandle {
        stop_tx: Some(stop_tx),
        worker: Some(worker),
    }
}
