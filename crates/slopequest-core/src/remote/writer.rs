//! # Remote Write Queue
//!
//! Single-flight, coalescing writer for remote profile snapshots.
//!
//! - One background thread performs every `force_save`
//! - At most one write is in flight at a time
//! - One pending slot: a newer snapshot replaces an unsent older one
//!
//! Snapshots therefore land remotely in the order they were taken, and a
//! slow network never delays gameplay. Failed writes are logged and dropped;
//! the next mutation submits a fresh full snapshot.

use super::{RemoteAccount, RemoteDocument, RemoteProfileStore};
use crate::QuizError;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// Counters describing the writer's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterStats {
    /// Snapshots handed to `submit`.
    pub submitted: u64,
    /// Snapshots the remote store accepted.
    pub written: u64,
    /// Snapshots the remote store rejected.
    pub failed: u64,
    /// Snapshots replaced by a newer one before being sent.
    pub coalesced: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: Option<(RemoteAccount, RemoteDocument)>,
    in_flight: bool,
    shutdown: bool,
    /// The worker thread is gone; nothing queued will be sent.
    exited: bool,
    stats: WriterStats,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<QueueState>,
    /// Signalled when work arrives or shutdown is requested.
    wake: Condvar,
    /// Signalled when the queue drains.
    idle: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background writer for remote snapshots.
///
/// Dropping the writer sends any pending snapshot, then joins the thread.
pub struct RemoteWriter {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for RemoteWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteWriter")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl RemoteWriter {
    /// Start the writer thread.
    pub fn spawn(remote: Arc<dyn RemoteProfileStore>) -> Result<Self, QuizError> {
        let shared = Arc::new(Shared::default());
        let worker = Arc::clone(&shared);

        let handle = std::thread::Builder::new()
            .name("slopequest-remote-writer".to_string())
            .spawn(move || run(&worker, remote.as_ref()))
            .map_err(|e| QuizError::IoError(format!("cannot start remote writer: {}", e)))?;

        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Queue a snapshot, replacing any snapshot not yet sent.
    pub fn submit(&self, account: RemoteAccount, document: RemoteDocument) {
        let mut state = self.shared.lock();
        state.stats.submitted += 1;
        if state.pending.replace((account, document)).is_some() {
            state.stats.coalesced += 1;
        }
        drop(state);
        self.shared.wake.notify_one();
    }

    /// Block until nothing is pending or in flight, or the worker is gone.
    pub fn flush(&self) {
        let mut state = self.shared.lock();
        while (state.pending.is_some() || state.in_flight) && !state.exited {
            state = self
                .shared
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    #[must_use]
    pub fn stats(&self) -> WriterStats {
        self.shared.lock().stats
    }
}

impl Drop for RemoteWriter {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_one();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("remote writer thread panicked");
            }
        }
    }
}

/// Marks the worker as exited when `run` returns or unwinds, so `flush`
/// never waits on a dead thread.
struct ExitGuard<'a>(&'a Shared);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        if std::mem::take(&mut state.in_flight) {
            state.stats.failed += 1;
        }
        state.exited = true;
        drop(state);
        self.0.idle.notify_all();
    }
}

fn run(shared: &Shared, remote: &dyn RemoteProfileStore) {
    let _exit = ExitGuard(shared);
    loop {
        let (account, document) = {
            let mut state = shared.lock();
            while state.pending.is_none() && !state.shutdown {
                state = shared
                    .wake
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            // Shutdown still drains the last snapshot.
            let Some(job) = state.pending.take() else {
                break;
            };
            state.in_flight = true;
            job
        };

        let result = remote.force_save(&account, &document);

        let mut state = shared.lock();
        state.in_flight = false;
        match result {
            Ok(()) => {
                state.stats.written += 1;
                tracing::debug!(%account, "remote profile saved");
            }
            Err(e) => {
                state.stats.failed += 1;
                tracing::warn!(%account, error = %e, "remote profile save failed; local cache stays authoritative");
            }
        }
        if state.pending.is_none() {
            shared.idle.notify_all();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MemoryRemoteStore, RemoteValue, fields};
    use std::time::Duration;

    fn doc_with_score(score: i64) -> RemoteDocument {
        let mut doc = RemoteDocument::new();
        doc.insert(fields::SCORE, RemoteValue::Int(score));
        doc
    }

    #[test]
    fn submitted_snapshot_is_written() {
        let remote = MemoryRemoteStore::new("acct");
        let writer = RemoteWriter::spawn(Arc::new(remote.clone())).expect("spawn");

        writer.submit(remote.account().clone(), doc_with_score(10));
        writer.flush();

        assert_eq!(remote.document(), Some(doc_with_score(10)));
        assert_eq!(writer.stats().written, 1);
    }

    #[test]
    fn burst_coalesces_to_latest_snapshot() {
        let remote = MemoryRemoteStore::new("acct");
        remote.set_write_delay(Some(Duration::from_millis(30)));
        let writer = RemoteWriter::spawn(Arc::new(remote.clone())).expect("spawn");

        for score in 1..=20 {
            writer.submit(remote.account().clone(), doc_with_score(score));
        }
        writer.flush();

        let saves = remote.saved_documents();
        assert_eq!(saves.last(), Some(&doc_with_score(20)));
        assert!(saves.len() < 20);

        // Writes land in submission order.
        let scores: Vec<i64> = saves
            .iter()
            .filter_map(|d| d.get_int(fields::SCORE))
            .collect();
        assert!(scores.windows(2).all(|w| w[0] < w[1]));

        let stats = writer.stats();
        assert_eq!(stats.submitted, 20);
        assert_eq!(stats.written + stats.coalesced, 20);
    }

    #[test]
    fn failures_are_counted_not_retried() {
        let remote = MemoryRemoteStore::new("acct");
        remote.set_available(false);
        let writer = RemoteWriter::spawn(Arc::new(remote.clone())).expect("spawn");

        writer.submit(remote.account().clone(), doc_with_score(5));
        writer.flush();

        assert_eq!(writer.stats().failed, 1);
        assert!(remote.document().is_none());

        remote.set_available(true);
        writer.flush();
        assert!(remote.document().is_none());
    }

    #[test]
    fn drop_drains_pending_snapshot() {
        let remote = MemoryRemoteStore::new("acct");
        {
            let writer = RemoteWriter::spawn(Arc::new(remote.clone())).expect("spawn");
            writer.submit(remote.account().clone(), doc_with_score(77));
        }
        assert_eq!(remote.document(), Some(doc_with_score(77)));
    }

    /// A store whose every save blows up.
    struct BrokenStore;

    #[allow(clippy::panic)]
    impl RemoteProfileStore for BrokenStore {
        fn authenticate(&self) -> Result<RemoteAccount, QuizError> {
            Ok(RemoteAccount::new("acct"))
        }

        fn load_all(&self, _account: &RemoteAccount) -> Result<RemoteDocument, QuizError> {
            Ok(RemoteDocument::new())
        }

        fn force_save(
            &self,
            _account: &RemoteAccount,
            _document: &RemoteDocument,
        ) -> Result<(), QuizError> {
            panic!("store crashed");
        }
    }

    #[test]
    fn flush_returns_after_worker_panic() {
        let writer = RemoteWriter::spawn(Arc::new(BrokenStore)).expect("spawn");

        writer.submit(RemoteAccount::new("acct"), doc_with_score(1));
        writer.flush();
        assert_eq!(writer.stats().failed, 1);

        // Later snapshots have nowhere to go but must not hang the caller.
        writer.submit(RemoteAccount::new("acct"), doc_with_score(2));
        writer.flush();
        drop(writer);
    }
}
