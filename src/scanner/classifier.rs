//! Turns the walker's directory stream into sized, deduplicated items.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::item::Item;
use super::patterns::{classify_by_name, GitignoreRules};
use super::size::total_size;
use super::walker::{walk, ScanStats, WalkEntry, WalkOptions};
use crate::cancel::CancellationToken;
use crate::error::{Result, TidyError};

/// Prefix of every gitignore-mode category; the matching line follows it.
pub const GITIGNORE_CATEGORY_PREFIX: &str = "Gitignore pattern: ";

/// Which rule set decides what counts as an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// The built-in pattern table, matched against base names.
    #[default]
    Builtin,
    /// The lines of `<root>/.gitignore`, matched against relative paths.
    Gitignore,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Builtin => write!(f, "builtin patterns"),
            ScanMode::Gitignore => write!(f, ".gitignore"),
        }
    }
}

#[derive(Debug)]
enum Matcher {
    Builtin,
    Gitignore(GitignoreRules),
}

/// Classifies directories below one root. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Classifier {
    root: PathBuf,
    matcher: Arc<Matcher>,
}

/// Check that `path` is an existing directory and canonicalize it.
pub fn resolve_root(path: &Path) -> Result<PathBuf> {
    let metadata =
        fs::metadata(path).map_err(|_| TidyError::DirectoryNotFound(path.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(TidyError::NotADirectory(path.to_path_buf()));
    }
    path.canonicalize().map_err(|source| TidyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Classifier {
    /// Validate `root` and load whatever rules `mode` needs.
    pub fn new(root: &Path, mode: ScanMode) -> Result<Self> {
        let root = resolve_root(root)?;
        let matcher = match mode {
            ScanMode::Builtin => Matcher::Builtin,
            ScanMode::Gitignore => Matcher::Gitignore(GitignoreRules::load(&root)?),
        };
        Ok(Self {
            root,
            matcher: Arc::new(matcher),
        })
    }

    pub fn builtin(root: &Path) -> Result<Self> {
        Self::new(root, ScanMode::Builtin)
    }

    pub fn from_gitignore(root: &Path) -> Result<Self> {
        Self::new(root, ScanMode::Gitignore)
    }

    /// Canonical scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> ScanMode {
        match *self.matcher {
            Matcher::Builtin => ScanMode::Builtin,
            Matcher::Gitignore(_) => ScanMode::Gitignore,
        }
    }

    /// Category for `path`, or `None` if it is not an artifact.
    pub fn classify(&self, path: &Path) -> Option<String> {
        match &*self.matcher {
            Matcher::Builtin => {
                let name = path.file_name()?.to_str()?;
                classify_by_name(name).map(str::to_string)
            }
            Matcher::Gitignore(rules) => {
                let relative = self.relative_path(path)?;
                rules
                    .first_match(&relative)
                    .map(|rule| format!("{GITIGNORE_CATEGORY_PREFIX}{}", rule.line()))
            }
        }
    }

    /// Root-relative path with `/` separators. `None` for the root itself
    /// and for paths outside it.
    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }

    /// Walk the root and return every artifact, largest first.
    ///
    /// Matched directories are reported but never entered, so an artifact is
    /// never nested inside another. Each accepted path is sized exactly once
    /// on the rayon pool while the walk continues. A cancelled scan returns
    /// [`TidyError::Cancelled`] and no partial result.
    pub fn scan(
        &self,
        options: &WalkOptions,
        cancel: &CancellationToken,
        stats: Arc<ScanStats>,
    ) -> Result<Vec<Item>> {
        tracing::info!(root = %self.root.display(), mode = %self.mode(), "Scanning for artifacts");

        let pruner = self.clone();
        let entries = walk(
            &self.root,
            options,
            move |entry: &WalkEntry| pruner.classify(&entry.path).is_none(),
            cancel,
            Arc::clone(&stats),
        );

        let accepted: Mutex<HashSet<PathBuf>> = Mutex::new(HashSet::new());
        let found: Mutex<Vec<Item>> = Mutex::new(Vec::new());

        rayon::scope(|scope| {
            for entry in entries.iter() {
                let Some(category) = self.classify(&entry.path) else {
                    continue;
                };
                let (accepted, found) = (&accepted, &found);
                scope.spawn(move |_| {
                    if !accepted.lock().insert(entry.path.clone()) {
                        return;
                    }
                    let size = total_size(&entry.path, cancel);
                    tracing::debug!(path = %entry.path.display(), %category, size, "Found artifact");
                    found.lock().push(Item::new(entry.path, category, size));
                });
            }
        });

        if cancel.is_cancelled() {
            tracing::info!(root = %self.root.display(), "Scan cancelled");
            return Err(TidyError::Cancelled);
        }

        let mut items = found.into_inner();
        sort_items(&mut items);

        tracing::info!(
            items = items.len(),
            dirs = stats.dirs_visited(),
            errors = stats.errors(),
            elapsed_ms = stats.elapsed().as_millis() as u64,
            "Scan complete"
        );

        Ok(items)
    }
}

/// Largest first; ties by path so output is stable.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
}
