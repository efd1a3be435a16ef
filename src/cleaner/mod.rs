//! Selection and deletion of scanned artifacts.
//!
//! This module provides:
//! - The inventory of found items and their selection state
//! - Sequential, cancellable deletion with per-item progress

mod executor;
mod inventory;

pub use executor::{
    delete_path, CleanupEvent, CleanupExecutor, CleanupProgress, CleanupSummary, DeleteOutcome,
    DEFAULT_PACING,
};
pub use inventory::InventoryStore;
