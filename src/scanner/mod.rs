//! Artifact discovery: directory walking, classification and sizing.
//!
//! [`Classifier::scan`] runs a whole scan on the calling thread.
//! [`start_scan`] runs the same scan on a background thread and hands back a
//! [`ScanHandle`] the caller polls, which is how the TUI keeps rendering
//! while the disk is walked.

mod classifier;
mod formatter;
mod item;
mod patterns;
mod size;
mod walker;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, TryRecvError};

pub use classifier::{resolve_root, sort_items, Classifier, ScanMode, GITIGNORE_CATEGORY_PREFIX};
pub use formatter::{format_json, format_table, ScanReport};
pub use item::Item;
pub use patterns::{
    classify_by_name, is_excluded_line, matches_gitignore_line, GitignoreRule, GitignoreRules,
    BUILTIN_PATTERNS,
};
pub use size::{format_size, total_size};
pub use walker::{default_workers, walk, ScanStats, WalkEntry, WalkOptions, ALWAYS_SKIPPED};

use crate::cancel::CancellationToken;
use crate::error::TidyError;

/// Final outcome of a background scan.
#[derive(Debug)]
pub enum ScanEvent {
    /// The scan finished; items are sorted largest first.
    Complete { items: Vec<Item>, duration: Duration },
    /// The scan stopped on an error.
    Failed { message: String },
    /// The scan observed cancellation and produced nothing.
    Cancelled,
}

/// Handle to a scan running on a background thread.
pub struct ScanHandle {
    events: Receiver<ScanEvent>,
    stats: Arc<ScanStats>,
    cancel: CancellationToken,
    _thread: Option<JoinHandle<()>>,
}

impl ScanHandle {
    /// Non-blocking check for the outcome.
    ///
    /// Yields the outcome at most once; the handle is spent afterwards.
    pub fn poll(&self) -> Option<ScanEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(ScanEvent::Failed {
                message: "scanner thread exited unexpectedly".to_string(),
            }),
        }
    }

    /// Block until the scan finishes.
    pub fn wait(self) -> ScanEvent {
        self.events.recv().unwrap_or(ScanEvent::Failed {
            message: "scanner thread exited unexpectedly".to_string(),
        })
    }

    /// Live counters for progress display.
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Request cancellation. The outcome will be [`ScanEvent::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Launch `classifier.scan` on a background thread.
pub fn start_scan(
    classifier: Classifier,
    options: WalkOptions,
    cancel: CancellationToken,
) -> ScanHandle {
    let (tx, rx) = bounded::<ScanEvent>(1);
    let stats = Arc::new(ScanStats::new());
    let thread_stats = Arc::clone(&stats);
    let thread_cancel = cancel.clone();

    let thread = thread::Builder::new()
        .name("devtidy-scanner".into())
        .spawn(move || {
            let started = Instant::now();
            let event = match classifier.scan(&options, &thread_cancel, thread_stats) {
                Ok(items) => ScanEvent::Complete {
                    items,
                    duration: started.elapsed(),
                },
                Err(TidyError::Cancelled) => ScanEvent::Cancelled,
                Err(err) => {
                    tracing::warn!(%err, "Scan failed");
                    ScanEvent::Failed {
                        message: err.to_string(),
                    }
                }
            };
            let _ = tx.send(event);
        });

    let thread = match thread {
        Ok(handle) => Some(handle),
        Err(err) => {
            // the closure and its sender are gone, so poll reports a failure
            tracing::error!(%err, "Failed to spawn scanner thread");
            None
        }
    };

    ScanHandle {
        events: rx,
        stats,
        cancel,
        _thread: thread,
    }
}
