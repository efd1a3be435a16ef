//! Bounded-concurrency directory walker.
//!
//! `W` worker threads share one LIFO frontier of pending directories behind a
//! mutex. A worker pops a directory, lists its immediate subdirectories, asks
//! the caller's descend predicate about each one, pushes the descendable ones
//! back onto the frontier and emits every one of them on a bounded channel.
//! The walk ends when the frontier is empty and no worker is mid-directory;
//! the channel then closes because every worker has dropped its sender.
//!
//! There is no recursion per directory, so memory is bounded by the width of
//! the frontier rather than the depth of the tree, and a slow consumer stalls
//! the workers through the channel instead of growing a queue.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};

use crate::cancel::CancellationToken;

/// How often blocked workers re-check the cancellation token.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Never reported or entered, whatever `skip_dirs` says.
pub const ALWAYS_SKIPPED: &str = ".git";

/// A directory discovered by the walker.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Full path of the directory.
    pub path: PathBuf,
    /// Depth below the walk root (the root's children are at depth 1).
    pub depth: usize,
    /// Metadata of the entry itself, if it could be read.
    pub metadata: Option<Metadata>,
}

impl WalkEntry {
    /// Base name, if it is valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Configuration options for a walk.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Number of worker threads (0 = available parallelism).
    pub workers: usize,

    /// Directory names that are neither reported nor entered, on top of
    /// [`ALWAYS_SKIPPED`].
    pub skip_dirs: Vec<String>,

    /// Deepest depth reported (None = unlimited).
    pub max_depth: Option<usize>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            skip_dirs: vec![".git".to_string()],
            max_depth: None,
        }
    }
}

impl WalkOptions {
    /// Create a new WalkOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of worker threads
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set directory names to skip. `.git` stays skipped regardless.
    pub fn with_skip_dirs(mut self, names: Vec<String>) -> Self {
        self.skip_dirs = names;
        self
    }

    /// Set maximum reported depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Worker count after resolving 0 to the machine's parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            default_workers()
        } else {
            self.workers
        }
    }
}

/// Available parallelism, or 4 if it cannot be determined.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Live counters for scan feedback. Never persisted.
#[derive(Debug)]
pub struct ScanStats {
    dirs_visited: AtomicU64,
    errors: AtomicU64,
    started: Instant,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStats {
    pub fn new() -> Self {
        Self {
            dirs_visited: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Directories whose contents have been listed, including the root.
    pub fn dirs_visited(&self) -> u64 {
        self.dirs_visited.load(Ordering::Relaxed)
    }

    /// Directories or entries that could not be read.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn record_visit(&self) {
        self.dirs_visited.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

struct Frontier {
    pending: Vec<(PathBuf, usize)>,
    /// Workers currently listing a directory.
    active: usize,
    /// Set once the consumer hung up or the walk was cancelled.
    stopped: bool,
}

struct Walk<F> {
    frontier: Mutex<Frontier>,
    wake: Condvar,
    descend: F,
    skip_dirs: Vec<String>,
    max_depth: Option<usize>,
    cancel: CancellationToken,
    stats: Arc<ScanStats>,
}

/// Walk every directory below `root` on a pool of worker threads.
///
/// `descend` is evaluated for each discovered directory before it is queued;
/// returning false still reports the directory but never lists its contents.
/// Symlinks are not followed and unreadable directories are skipped.
/// Traversal order is unspecified.
pub fn walk<F>(
    root: &Path,
    options: &WalkOptions,
    descend: F,
    cancel: &CancellationToken,
    stats: Arc<ScanStats>,
) -> Receiver<WalkEntry>
where
    F: Fn(&WalkEntry) -> bool + Send + Sync + 'static,
{
    let workers = options.effective_workers();
    let (tx, rx) = bounded(workers * 2);

    let walk = Arc::new(Walk {
        frontier: Mutex::new(Frontier {
            pending: vec![(root.to_path_buf(), 0)],
            active: 0,
            stopped: false,
        }),
        wake: Condvar::new(),
        descend,
        skip_dirs: options.skip_dirs.clone(),
        max_depth: options.max_depth,
        cancel: cancel.clone(),
        stats,
    });

    tracing::debug!(root = %root.display(), workers, "Starting directory walk");

    for id in 0..workers {
        let walk = Arc::clone(&walk);
        let tx = tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("devtidy-walker-{id}"))
            .spawn(move || walk.run_worker(&tx));
        if let Err(err) = spawned {
            tracing::warn!(%err, "Failed to spawn walker thread");
        }
    }

    rx
}

impl<F> Walk<F>
where
    F: Fn(&WalkEntry) -> bool,
{
    fn run_worker(&self, tx: &Sender<WalkEntry>) {
        while let Some((dir, depth)) = self.next_dir() {
            let delivered = self.visit(&dir, depth, tx);
            self.finish_dir(delivered);
        }
    }

    /// Pop the next directory, waiting while other workers may still add
    /// more. Returns `None` once the walk is over.
    fn next_dir(&self) -> Option<(PathBuf, usize)> {
        let mut frontier = self.frontier.lock();
        loop {
            if frontier.stopped || self.cancel.is_cancelled() {
                frontier.stopped = true;
                self.wake.notify_all();
                return None;
            }
            if let Some(next) = frontier.pending.pop() {
                frontier.active += 1;
                return Some(next);
            }
            if frontier.active == 0 {
                self.wake.notify_all();
                return None;
            }
            self.wake.wait_for(&mut frontier, POLL_INTERVAL);
        }
    }

    fn finish_dir(&self, delivered: bool) {
        let mut frontier = self.frontier.lock();
        frontier.active -= 1;
        if !delivered {
            frontier.stopped = true;
        }
        self.wake.notify_all();
    }

    /// List `dir`, queue descendable children and emit all of them.
    ///
    /// Returns false if the consumer is gone or the walk was cancelled
    /// while waiting on the channel.
    fn visit(&self, dir: &Path, depth: usize, tx: &Sender<WalkEntry>) -> bool {
        let child_depth = depth + 1;
        if self.max_depth.is_some_and(|max| child_depth > max) {
            return true;
        }

        self.stats.record_visit();

        let read_dir = match fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(err) => {
                self.stats.record_error();
                tracing::debug!(path = %dir.display(), %err, "Skipping unreadable directory");
                return true;
            }
        };

        let may_descend = self.max_depth.map_or(true, |max| child_depth < max);
        let mut children = Vec::new();
        let mut descendable = Vec::new();

        for result in read_dir {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    self.stats.record_error();
                    tracing::debug!(path = %dir.display(), %err, "Skipping unreadable entry");
                    continue;
                }
            };

            // file_type() does not follow symlinks, so linked dirs are skipped
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir || self.is_skipped(&entry.file_name()) {
                continue;
            }

            let child = WalkEntry {
                path: entry.path(),
                depth: child_depth,
                metadata: entry.metadata().ok(),
            };

            if may_descend && (self.descend)(&child) {
                descendable.push((child.path.clone(), child_depth));
            }
            children.push(child);
        }

        if !descendable.is_empty() {
            self.frontier.lock().pending.extend(descendable);
            self.wake.notify_all();
        }

        children.into_iter().all(|child| self.emit(tx, child))
    }

    fn is_skipped(&self, name: &std::ffi::OsStr) -> bool {
        name.to_str().is_some_and(|name| {
            name == ALWAYS_SKIPPED || self.skip_dirs.iter().any(|skip| skip == name)
        })
    }

    fn emit(&self, tx: &Sender<WalkEntry>, mut entry: WalkEntry) -> bool {
        loop {
            match tx.send_timeout(entry, POLL_INTERVAL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(returned)) => {
                    if self.cancel.is_cancelled() {
                        return false;
                    }
                    entry = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn create_tree(root: &Path, dirs: &[&str]) {
        for dir in dirs {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
    }

    fn collect(root: &Path, options: &WalkOptions, descend: impl Fn(&WalkEntry) -> bool + Send + Sync + 'static) -> Vec<PathBuf> {
        let rx = walk(
            root,
            options,
            descend,
            &CancellationToken::new(),
            Arc::new(ScanStats::new()),
        );
        rx.iter().map(|e| e.path).collect()
    }

    const TREE: &[&str] = &[
        "a/b/c",
        "a/d",
        "e/f/g/h",
        "i",
        "j/k",
        "j/l/m",
    ];

    fn expected(root: &Path) -> HashSet<PathBuf> {
        ["a", "a/b", "a/b/c", "a/d", "e", "e/f", "e/f/g", "e/f/g/h", "i", "j", "j/k", "j/l", "j/l/m"]
            .iter()
            .map(|p| root.join(p))
            .collect()
    }

    #[test]
    fn test_walk_visits_every_directory_once() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), TREE);
        fs::write(tmp.path().join("a/file.txt"), "not a dir").unwrap();

        for workers in [1, 2, 8] {
            let options = WalkOptions::new().with_workers(workers);
            let paths = collect(tmp.path(), &options, |_| true);
            let unique: HashSet<PathBuf> = paths.iter().cloned().collect();

            assert_eq!(paths.len(), unique.len(), "duplicates with {workers} workers");
            assert_eq!(unique, expected(tmp.path()), "wrong set with {workers} workers");
        }
    }

    #[test]
    fn test_walk_prunes_when_predicate_refuses() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), &["app/node_modules/lodash/dist", "app/src"]);

        let paths = collect(tmp.path(), &WalkOptions::new().with_workers(4), |e| {
            e.name() != Some("node_modules")
        });

        assert!(paths.contains(&tmp.path().join("app/node_modules")));
        assert!(paths.contains(&tmp.path().join("app/src")));
        assert!(!paths.iter().any(|p| p.starts_with(tmp.path().join("app/node_modules/lodash"))));
    }

    #[test]
    fn test_walk_skips_git_directories() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), &[".git/objects", "src"]);

        let paths = collect(tmp.path(), &WalkOptions::default(), |_| true);

        assert_eq!(paths, vec![tmp.path().join("src")]);
    }

    #[test]
    fn test_walk_skips_git_with_custom_skip_list() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), &[".git/objects", "tmp/cache", "src"]);

        for skip_dirs in [Vec::new(), vec!["tmp".to_string()]] {
            let options = WalkOptions::new().with_workers(2).with_skip_dirs(skip_dirs.clone());
            let paths = collect(tmp.path(), &options, |_| true);

            assert!(
                !paths.iter().any(|p| p.starts_with(tmp.path().join(".git"))),
                ".git walked with skip_dirs {skip_dirs:?}"
            );
            assert!(paths.contains(&tmp.path().join("src")));
        }
    }

    #[test]
    fn test_walk_respects_max_depth() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), &["one/two/three"]);

        let options = WalkOptions::new().with_max_depth(Some(2));
        let mut paths = collect(tmp.path(), &options, |_| true);
        paths.sort();

        assert_eq!(paths, vec![tmp.path().join("one"), tmp.path().join("one/two")]);

        let options = WalkOptions::new().with_max_depth(Some(0));
        assert!(collect(tmp.path(), &options, |_| true).is_empty());
    }

    #[test]
    fn test_walk_reports_depth() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), &["one/two"]);

        let rx = walk(
            tmp.path(),
            &WalkOptions::new().with_workers(1),
            |_| true,
            &CancellationToken::new(),
            Arc::new(ScanStats::new()),
        );
        let depths: Vec<(String, usize)> = rx
            .iter()
            .map(|e| (e.name().unwrap().to_string(), e.depth))
            .collect();

        assert!(depths.contains(&("one".to_string(), 1)));
        assert!(depths.contains(&("two".to_string(), 2)));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_does_not_follow_symlinks() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), &["real/inner"]);
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link")).unwrap();

        let paths = collect(tmp.path(), &WalkOptions::default(), |_| true);

        assert_eq!(paths.len(), 2);
        assert!(!paths.iter().any(|p| p.starts_with(tmp.path().join("link"))));
    }

    #[test]
    fn test_walk_counts_visited_directories() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), TREE);

        let stats = Arc::new(ScanStats::new());
        let rx = walk(
            tmp.path(),
            &WalkOptions::new().with_workers(3),
            |_| true,
            &CancellationToken::new(),
            Arc::clone(&stats),
        );
        let emitted = rx.iter().count() as u64;

        // every emitted directory is listed once, plus the root
        assert_eq!(stats.dirs_visited(), emitted + 1);
        assert_eq!(stats.errors(), 0);
    }

    #[test]
    fn test_walk_nonexistent_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let stats = Arc::new(ScanStats::new());
        let rx = walk(
            &tmp.path().join("missing"),
            &WalkOptions::default(),
            |_| true,
            &CancellationToken::new(),
            Arc::clone(&stats),
        );

        assert_eq!(rx.iter().count(), 0);
        assert_eq!(stats.errors(), 1);
    }

    #[test]
    fn test_walk_cancelled_before_start() {
        let tmp = TempDir::new().unwrap();
        create_tree(tmp.path(), TREE);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let rx = walk(
            tmp.path(),
            &WalkOptions::new().with_workers(2),
            |_| true,
            &cancel,
            Arc::new(ScanStats::new()),
        );

        assert_eq!(rx.iter().count(), 0);
    }

    #[test]
    fn test_walk_stops_when_receiver_dropped() {
        let tmp = TempDir::new().unwrap();
        for i in 0..50 {
            create_tree(tmp.path(), &[&format!("dir{i}/sub")]);
        }

        let stats = Arc::new(ScanStats::new());
        let rx = walk(
            tmp.path(),
            &WalkOptions::new().with_workers(1),
            |_| true,
            &CancellationToken::new(),
            Arc::clone(&stats),
        );
        let first = rx.recv().unwrap();
        drop(rx);

        assert!(first.path.starts_with(tmp.path()));
    }

    #[test]
    fn test_effective_workers() {
        assert_eq!(WalkOptions::new().with_workers(3).effective_workers(), 3);
        assert!(WalkOptions::new().effective_workers() >= 1);
    }

    #[test]
    fn test_default_options_skip_git() {
        let opts = WalkOptions::default();
        assert_eq!(opts.workers, 0);
        assert_eq!(opts.skip_dirs, vec![".git".to_string()]);
        assert_eq!(opts.max_depth, None);
    }
}
