//! Cooperative cancellation shared by the scanner and the cleanup worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable flag that long-running work polls between units of work.
///
/// Walker workers check it before popping the next directory, the size
/// aggregator before each file, and the cleanup worker before each item.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that all holders of this token stop as soon as possible.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
