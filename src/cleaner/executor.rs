//! Executor for deleting selected items.
//!
//! Deletion runs on one worker thread, strictly in inventory order. The
//! worker never touches the inventory: it reports each outcome over a
//! channel and the owner of the [`InventoryStore`] applies it through
//! [`CleanupExecutor::poll`] or [`CleanupExecutor::wait`].

use std::fs;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

use super::inventory::InventoryStore;
use crate::cancel::CancellationToken;
use crate::error::{Result, TidyError};
use crate::scanner::Item;

/// Delay between deletions when progress is shown to a person.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

const PAUSE_SLICE: Duration = Duration::from_millis(25);

/// Emitted once per processed item; `completed` strictly increases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupProgress {
    pub path: PathBuf,
    pub completed: usize,
    pub total: usize,
    /// Set when this item could not be deleted.
    pub error: Option<String>,
}

/// Totals for one cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub freed_bytes: u64,
    /// True if the run stopped before processing every item.
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupEvent {
    Progress(CleanupProgress),
    Finished(CleanupSummary),
}

/// What a successful deletion found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    /// Nothing was there any more.
    AlreadyGone,
}

/// Remove a file or directory tree without following symlinks.
pub fn delete_path(path: &Path) -> io::Result<DeleteOutcome> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DeleteOutcome::AlreadyGone),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(DeleteOutcome::Removed),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DeleteOutcome::AlreadyGone),
        Err(e) => Err(e),
    }
}

struct Deletion {
    item: Item,
    outcome: std::result::Result<DeleteOutcome, String>,
}

struct Run {
    rx: Receiver<Deletion>,
    total: usize,
    completed: usize,
    summary: CleanupSummary,
    cancel: CancellationToken,
    started: Instant,
    worker: Option<JoinHandle<()>>,
}

enum Phase {
    Idle,
    Running(Run),
}

/// Deletes the selected items of an inventory, one at a time.
///
/// `Idle -> Running -> Idle`. While running, only [`poll`](Self::poll),
/// [`wait`](Self::wait) and [`cancel`](Self::cancel) make progress; a second
/// [`start`](Self::start) is refused.
pub struct CleanupExecutor {
    phase: Phase,
    pacing: Duration,
    shutdown: CancellationToken,
    cleaned_bytes: u64,
}

impl CleanupExecutor {
    /// `shutdown` stops any run in progress when tripped; `pacing` is the
    /// pause between two deletions.
    pub fn new(pacing: Duration, shutdown: CancellationToken) -> Self {
        Self {
            phase: Phase::Idle,
            pacing,
            shutdown,
            cleaned_bytes: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    /// `(completed, total)` of the current run.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match &self.phase {
            Phase::Running(run) => Some((run.completed, run.total)),
            Phase::Idle => None,
        }
    }

    /// Bytes freed by every run of this executor so far.
    pub fn cleaned_bytes(&self) -> u64 {
        self.cleaned_bytes
    }

    /// Snapshot the selected items and start deleting them.
    ///
    /// Toggling selections afterwards does not change what this run deletes.
    /// Returns the number of items queued.
    pub fn start(&mut self, inventory: &InventoryStore) -> Result<usize> {
        if self.is_running() {
            return Err(TidyError::CleanupInProgress);
        }
        let items = inventory.selected_items();
        if items.is_empty() {
            return Err(TidyError::NoSelection);
        }

        let total = items.len();
        let (tx, rx) = bounded(total);
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        let shutdown = self.shutdown.clone();
        let pacing = self.pacing;

        let worker = thread::Builder::new()
            .name("devtidy-cleanup".into())
            .spawn(move || run_worker(items, pacing, &shutdown, &worker_cancel, &tx))
            .map_err(TidyError::Thread)?;

        tracing::info!(
            items = total,
            bytes = inventory.total_selected_size(),
            "Starting cleanup"
        );

        self.phase = Phase::Running(Run {
            rx,
            total,
            completed: 0,
            summary: CleanupSummary {
                total,
                ..CleanupSummary::default()
            },
            cancel,
            started: Instant::now(),
            worker: Some(worker),
        });

        Ok(total)
    }

    /// Stop the current run before its next item.
    pub fn cancel(&self) {
        if let Phase::Running(run) = &self.phase {
            run.cancel.cancel();
        }
    }

    /// Apply every outcome that is ready without blocking.
    pub fn poll(&mut self, inventory: &mut InventoryStore) -> Vec<CleanupEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next(inventory, false) {
            let finished = matches!(event, CleanupEvent::Finished(_));
            events.push(event);
            if finished {
                break;
            }
        }
        events
    }

    /// Block until the run ends, passing each event to `on_event`.
    ///
    /// Returns `None` if nothing was running.
    pub fn wait(
        &mut self,
        inventory: &mut InventoryStore,
        mut on_event: impl FnMut(&CleanupEvent),
    ) -> Option<CleanupSummary> {
        while let Some(event) = self.next(inventory, true) {
            on_event(&event);
            if let CleanupEvent::Finished(summary) = event {
                return Some(summary);
            }
        }
        None
    }

    fn next(&mut self, inventory: &mut InventoryStore, block: bool) -> Option<CleanupEvent> {
        let Phase::Running(run) = &mut self.phase else {
            return None;
        };

        if run.completed < run.total {
            let received = if block {
                run.rx.recv().ok()
            } else {
                match run.rx.try_recv() {
                    Ok(deletion) => Some(deletion),
                    Err(TryRecvError::Empty) => return None,
                    Err(TryRecvError::Disconnected) => None,
                }
            };

            // a closed channel means the worker stopped early
            if let Some(deletion) = received {
                let progress = run.apply(deletion, inventory, &mut self.cleaned_bytes);
                return Some(CleanupEvent::Progress(progress));
            }
        }

        Some(CleanupEvent::Finished(self.finish()))
    }

    fn finish(&mut self) -> CleanupSummary {
        let Phase::Running(mut run) = mem::replace(&mut self.phase, Phase::Idle) else {
            return CleanupSummary::default();
        };

        if let Some(worker) = run.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Cleanup worker panicked");
            }
        }

        run.summary.cancelled = run.completed < run.total;
        tracing::info!(
            succeeded = run.summary.succeeded,
            failed = run.summary.failed,
            freed = run.summary.freed_bytes,
            cancelled = run.summary.cancelled,
            elapsed_ms = run.started.elapsed().as_millis() as u64,
            "Cleanup finished"
        );
        run.summary
    }
}

impl Drop for CleanupExecutor {
    fn drop(&mut self) {
        if let Phase::Running(run) = &self.phase {
            run.cancel.cancel();
        }
    }
}

impl Run {
    fn apply(
        &mut self,
        deletion: Deletion,
        inventory: &mut InventoryStore,
        cleaned_bytes: &mut u64,
    ) -> CleanupProgress {
        self.completed += 1;
        let Deletion { item, outcome } = deletion;

        let error = match outcome {
            Ok(outcome) => {
                let freed = match outcome {
                    DeleteOutcome::Removed => item.size,
                    DeleteOutcome::AlreadyGone => 0,
                };
                *cleaned_bytes += freed;
                self.summary.succeeded += 1;
                self.summary.freed_bytes += freed;
                inventory.remove(&item.path);
                tracing::info!(path = %item.path.display(), freed, ?outcome, "Deleted");
                None
            }
            Err(message) => {
                self.summary.failed += 1;
                tracing::warn!(path = %item.path.display(), error = %message, "Failed to delete");
                Some(message)
            }
        };

        CleanupProgress {
            path: item.path,
            completed: self.completed,
            total: self.total,
            error,
        }
    }
}

fn run_worker(
    items: Vec<Item>,
    pacing: Duration,
    shutdown: &CancellationToken,
    cancel: &CancellationToken,
    tx: &Sender<Deletion>,
) {
    let stopped = || shutdown.is_cancelled() || cancel.is_cancelled();

    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            pause(pacing, &stopped);
        }
        if stopped() {
            tracing::debug!(processed = index, "Cleanup worker cancelled");
            break;
        }

        let outcome = delete_path(&item.path).map_err(|e| e.to_string());
        if tx.send(Deletion { item, outcome }).is_err() {
            break;
        }
    }
}

/// Sleep for `duration`, waking early once `stopped` holds.
fn pause(duration: Duration, stopped: &impl Fn() -> bool) {
    let deadline = Instant::now() + duration;
    loop {
        let now = Instant::now();
        if now >= deadline || stopped() {
            return;
        }
        thread::sleep(PAUSE_SLICE.min(deadline - now));
    }
}
