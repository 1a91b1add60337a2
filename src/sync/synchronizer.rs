use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::store::{ProgressStore, ProgressUpdate, ResourceId, ensure_and_update};
use crate::sync::scheduler::DebounceScheduler;

enum SyncCommand {
    Dirty(ProgressUpdate),
    Shutdown,
}

/// What the worker did over its lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub writes: usize,
    pub failures: usize,
    pub last_written: Option<ProgressUpdate>,
}

/// Pushes match progress to a store from a background thread.
///
/// Writes are debounced, one at a time, and never retried: a failed write is
/// logged and the next change carries the newer state forward.
pub struct Synchronizer {
    tx: mpsc::Sender<SyncCommand>,
    handle: Option<JoinHandle<SyncReport>>,
}

impl Synchronizer {
    pub fn spawn(store: Arc<dyn ProgressStore>, resource: ResourceId, window: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(format!("sync-{resource}"))
            .spawn(move || run_worker(store, resource, rx, DebounceScheduler::new(window)));

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                // Without a worker the session still works; progress just isn't saved.
                warn!(%err, "failed to spawn sync worker");
                None
            }
        };
        Self { tx, handle }
    }

    pub fn mark_dirty(&self, update: ProgressUpdate) {
        if self.tx.send(SyncCommand::Dirty(update)).is_err() {
            debug!("sync worker gone, dropping progress signal");
        }
    }

    /// Flush whatever is pending and wait for the worker to finish.
    pub fn shutdown(mut self) -> SyncReport {
        self.stop()
    }

    fn stop(&mut self) -> SyncReport {
        let _ = self.tx.send(SyncCommand::Shutdown);
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                warn!("sync worker panicked");
                SyncReport::default()
            }),
            None => SyncReport::default(),
        }
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn run_worker(
    store: Arc<dyn ProgressStore>,
    resource: ResourceId,
    rx: mpsc::Receiver<SyncCommand>,
    mut scheduler: DebounceScheduler,
) -> SyncReport {
    let mut report = SyncReport::default();
    debug!(%resource, window_ms = scheduler.window().as_millis() as u64, "sync worker started");

    loop {
        let command = match scheduler.time_until_due(Instant::now()) {
            Some(wait) => match rx.recv_timeout(wait) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(SyncCommand::Shutdown),
            },
            None => Some(rx.recv().unwrap_or(SyncCommand::Shutdown)),
        };

        match command {
            Some(SyncCommand::Dirty(update)) => scheduler.signal(update, Instant::now()),
            Some(SyncCommand::Shutdown) => {
                if let Some(update) = scheduler.take_pending() {
                    debug!(%resource, "flushing pending progress on shutdown");
                    write(store.as_ref(), &resource, update, &mut report);
                }
                break;
            }
            None => {}
        }

        if let Some(update) = scheduler.poll(Instant::now()) {
            write(store.as_ref(), &resource, update, &mut report);
            scheduler.complete();
        }
    }

    info!(
        %resource,
        writes = report.writes,
        failures = report.failures,
        "sync worker stopped"
    );
    report
}

fn write(
    store: &dyn ProgressStore,
    resource: &ResourceId,
    update: ProgressUpdate,
    report: &mut SyncReport,
) {
    match ensure_and_update(store, resource, &update) {
        Ok(_) => {
            debug!(
                %resource,
                index = update.current_token_index,
                completed = update.is_completed,
                "progress synced"
            );
            report.writes += 1;
            report.last_written = Some(update);
        }
        Err(err) => {
            warn!(%resource, %err, "progress sync failed, dropping checkpoint");
            report.failures += 1;
        }
    }
}
