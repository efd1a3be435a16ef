use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::cancel::CancellationToken;

/// Sum of regular-file sizes below `path`.
///
/// Directories contribute nothing and symlinks are not followed. Stat calls
/// fan out over the rayon pool, which is bounded by available parallelism.
/// Unreadable entries count as zero. Cancelling stops new stat calls; the
/// partial sum returned then is meaningless and callers discard it.
pub fn total_size(path: &Path, cancel: &CancellationToken) -> u64 {
    let total = AtomicU64::new(0);

    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .take_while(|_| !cancel.is_cancelled())
        .par_bridge()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .for_each(|entry| {
            if let Ok(metadata) = entry.metadata() {
                total.fetch_add(metadata.len(), Ordering::Relaxed);
            }
        });

    total.into_inner()
}

/// Format size in human-readable binary units ("1.5 KiB").
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
