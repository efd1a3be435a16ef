//! Application state for the TUI.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::cancel::CancellationToken;
use crate::cleaner::{CleanupEvent, CleanupExecutor, InventoryStore};
use crate::scanner::{self, format_size, Classifier, Item, ScanEvent, ScanHandle, WalkOptions};

/// Which stage of the session the user is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A scan is running; the inventory is empty.
    Scanning,
    /// Items are listed and can be selected and cleaned.
    Selecting,
}

/// The current UI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Normal navigation mode.
    Normal,
    /// Typing a filter.
    Filter,
    /// Asking before deleting the selection.
    Confirm,
    /// Help overlay mode.
    Help,
}

/// Main application state for the TUI.
///
/// Owns the inventory; scan results and cleanup outcomes are applied here,
/// on the thread that handles keys.
pub struct App {
    /// Canonical scan root.
    pub root: PathBuf,

    pub phase: Phase,

    /// Current UI mode.
    pub mode: Mode,

    pub inventory: InventoryStore,

    /// Indices into `inventory.items()` that pass the filter.
    pub visible: Vec<usize>,

    /// Cursor position in `visible`.
    pub cursor: usize,

    /// Case-insensitive filter on path and category.
    pub filter: String,

    /// Application should quit.
    pub should_quit: bool,

    /// Status message to display.
    pub status_message: Option<String>,

    /// Most recent failure, shown until the next one.
    pub last_error: Option<String>,

    /// Duration of the last completed scan.
    pub scan_duration: Option<Duration>,

    /// Animation frame counter, advanced on every tick.
    pub tick_count: usize,

    classifier: Classifier,
    walk_options: WalkOptions,
    executor: CleanupExecutor,
    shutdown: CancellationToken,
    scan: Option<ScanHandle>,
    scan_started: Instant,
}

impl App {
    /// Create an idle app. Call [`App::start_scan`] to begin.
    pub fn new(classifier: Classifier, walk_options: WalkOptions, pacing: Duration) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            root: classifier.root().to_path_buf(),
            phase: Phase::Selecting,
            mode: Mode::Normal,
            inventory: InventoryStore::new(),
            visible: Vec::new(),
            cursor: 0,
            filter: String::new(),
            should_quit: false,
            status_message: None,
            last_error: None,
            scan_duration: None,
            tick_count: 0,
            classifier,
            walk_options,
            executor: CleanupExecutor::new(pacing, shutdown.clone()),
            shutdown,
            scan: None,
            scan_started: Instant::now(),
        }
    }

    /// Discard the inventory and scan the root again in the background.
    pub fn start_scan(&mut self) {
        if self.executor.is_running() {
            self.status_message = Some("Cannot rescan while cleaning".to_string());
            return;
        }
        if self.phase == Phase::Scanning && self.scan.is_some() {
            return;
        }

        self.inventory.clear();
        self.visible.clear();
        self.cursor = 0;
        self.scan_duration = None;
        self.status_message = None;
        self.phase = Phase::Scanning;
        self.scan_started = Instant::now();
        self.scan = Some(scanner::start_scan(
            self.classifier.clone(),
            self.walk_options.clone(),
            CancellationToken::new(),
        ));
    }

    /// Replace the inventory with a finished scan's items.
    pub fn load_items(&mut self, items: Vec<Item>, duration: Duration) {
        self.inventory.replace(items);
        self.scan_duration = Some(duration);
        self.phase = Phase::Selecting;
        self.cursor = 0;
        self.rebuild_visible();
        tracing::info!(items = self.inventory.len(), "Inventory loaded");
    }

    /// Advance animations and apply background results.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        self.poll_scan();
        self.poll_cleanup();
    }

    fn poll_scan(&mut self) {
        let Some(event) = self.scan.as_ref().and_then(ScanHandle::poll) else {
            return;
        };
        self.scan = None;

        match event {
            ScanEvent::Complete { items, duration } => self.load_items(items, duration),
            ScanEvent::Failed { message } => {
                self.phase = Phase::Selecting;
                self.last_error = Some(format!("Scan failed: {message}"));
            }
            ScanEvent::Cancelled => {
                self.phase = Phase::Selecting;
                self.status_message = Some("Scan cancelled".to_string());
            }
        }
    }

    fn poll_cleanup(&mut self) {
        let events = self.executor.poll(&mut self.inventory);
        if events.is_empty() {
            return;
        }

        for event in events {
            match event {
                CleanupEvent::Progress(progress) => {
                    if let Some(error) = progress.error {
                        self.last_error =
                            Some(format!("Failed to delete {}: {}", progress.path.display(), error));
                    }
                }
                CleanupEvent::Finished(summary) => {
                    let mut message = format!("Freed {}", format_size(summary.freed_bytes));
                    if summary.failed > 0 {
                        message.push_str(&format!(", {} failed", summary.failed));
                    }
                    if summary.cancelled {
                        message.push_str(" (cancelled)");
                    }
                    self.status_message = Some(message);
                }
            }
        }

        self.rebuild_visible();
    }

    /// Recompute `visible` from the filter and keep the cursor in range.
    pub fn rebuild_visible(&mut self) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .inventory
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                needle.is_empty()
                    || item.category.to_lowercase().contains(&needle)
                    || item
                        .path
                        .strip_prefix(&self.root)
                        .unwrap_or(&item.path)
                        .to_string_lossy()
                        .to_lowercase()
                        .contains(&needle)
            })
            .map(|(index, _)| index)
            .collect();

        if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len().saturating_sub(1);
        }
    }

    /// Item under the cursor.
    pub fn current_item(&self) -> Option<&Item> {
        let index = *self.visible.get(self.cursor)?;
        self.inventory.items().get(index)
    }

    /// Move the cursor by `delta`, clamped to the list.
    pub fn move_cursor(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    pub fn cursor_to_top(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_to_bottom(&mut self) {
        self.cursor = self.visible.len().saturating_sub(1);
    }

    pub fn is_cleaning(&self) -> bool {
        self.executor.is_running()
    }

    /// `(completed, total)` of the running cleanup.
    pub fn cleanup_progress(&self) -> Option<(usize, usize)> {
        self.executor.progress()
    }

    /// Bytes freed during this session.
    pub fn cleaned_bytes(&self) -> u64 {
        self.executor.cleaned_bytes()
    }

    /// Directories visited and elapsed time of the running scan.
    pub fn scan_progress(&self) -> Option<(u64, Duration)> {
        self.scan
            .as_ref()
            .map(|scan| (scan.stats().dirs_visited(), self.scan_started.elapsed()))
    }

    /// Toggle the item under the cursor.
    pub fn toggle_current(&mut self) {
        if self.selection_locked() {
            return;
        }
        if let Some(path) = self.current_item().map(|item| item.path.clone()) {
            self.inventory.toggle(&path);
        }
    }

    /// Select everything, or deselect everything if all are selected.
    pub fn toggle_all(&mut self) {
        if self.selection_locked() || self.inventory.is_empty() {
            return;
        }
        let all_selected = self.inventory.selected_count() == self.inventory.len();
        self.inventory.set_all_selected(!all_selected);
    }

    fn selection_locked(&mut self) -> bool {
        if self.executor.is_running() {
            self.status_message = Some("Selection is locked while cleaning".to_string());
            return true;
        }
        false
    }

    /// Open the confirmation dialog if there is something to clean.
    pub fn request_cleanup(&mut self) {
        if self.executor.is_running() {
            self.status_message = Some("A cleanup is already running".to_string());
        } else if self.inventory.selected_count() == 0 {
            self.status_message = Some("Nothing selected".to_string());
        } else {
            self.mode = Mode::Confirm;
        }
    }

    /// Start deleting the selected items.
    pub fn start_cleanup(&mut self) {
        match self.executor.start(&self.inventory) {
            Ok(count) => {
                self.status_message = Some(format!(
                    "Cleaning {} item{}",
                    count,
                    if count == 1 { "" } else { "s" }
                ));
            }
            Err(err) => self.last_error = Some(err.to_string()),
        }
    }

    /// Stop background work and leave the main loop.
    pub fn quit(&mut self) {
        self.should_quit = true;
        self.shutdown.cancel();
        if let Some(scan) = &self.scan {
            scan.cancel();
        }
    }

    /// Wait for a cancelled cleanup to stop, applying its last results.
    pub fn finish_pending(&mut self) {
        self.executor.cancel();
        self.executor.wait(&mut self.inventory, |_| {});
    }

    /// "Scan time 1.20s | Selected: 3 items (1.5 GiB)"
    pub fn status_line(&self) -> String {
        let count = self.inventory.selected_count();
        let selected = format!(
            "Selected: {} item{} ({})",
            count,
            if count == 1 { "" } else { "s" },
            format_size(self.inventory.total_selected_size())
        );
        match self.scan_duration {
            Some(duration) => format!("Scan time {:.2}s | {}", duration.as_secs_f64(), selected),
            None => selected,
        }
    }
}
