//! devtidy - find and delete development artifacts
//!
//! This crate provides functionality for:
//! - Walking a directory tree concurrently and classifying artifact directories
//! - Selecting artifacts and deleting them with progress reporting
//! - Interactive TUI for browsing and cleaning

pub mod cancel;
pub mod cleaner;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod scanner;
pub mod signals;
pub mod tui;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use config::Config;
pub use error::{Result, TidyError};
