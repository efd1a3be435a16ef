//! Subcommand implementations.
//!
//! Everything here returns `anyhow::Result`; the binary maps the error chain
//! to an exit code.

pub mod clean;
pub mod scan;
pub mod tui;

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cancel::CancellationToken;
use crate::cli::TargetArgs;
use crate::config::Config;
use crate::error::TidyError;
use crate::scanner::{start_scan, Classifier, Item, ScanEvent, WalkOptions};
use crate::signals::install_interrupt_handler;

/// A validated root and the options to walk it with.
pub struct Target {
    pub classifier: Classifier,
    pub options: WalkOptions,
}

/// Resolve the root, load its rules and merge CLI flags over the config.
pub fn prepare_target(args: &TargetArgs, config: &Config) -> crate::error::Result<Target> {
    let classifier = Classifier::new(&args.path, args.mode())?;

    let mut options = config.walk_options();
    if let Some(jobs) = args.jobs {
        options = options.with_workers(jobs);
    }
    if let Some(depth) = args.max_depth {
        options = options.with_max_depth((depth > 0).then_some(depth));
    }

    tracing::debug!(
        root = %classifier.root().display(),
        mode = %classifier.mode(),
        workers = options.effective_workers(),
        max_depth = ?options.max_depth,
        "Prepared scan target"
    );

    Ok(Target {
        classifier,
        options,
    })
}

/// A token tripped by SIGINT or SIGTERM.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    if let Err(err) = install_interrupt_handler(token.clone()) {
        tracing::warn!(%err, "Failed to install signal handlers");
    }
    token
}

/// Scan `target` on a background thread with a spinner on stderr.
pub fn run_scan(
    target: &Target,
    cancel: &CancellationToken,
    show_progress: bool,
) -> Result<(Vec<Item>, Duration)> {
    let root = target.classifier.root().display().to_string();
    let progress = if show_progress {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    } else {
        ProgressBar::hidden()
    };

    let handle = start_scan(
        target.classifier.clone(),
        target.options.clone(),
        cancel.clone(),
    );

    let event = loop {
        if let Some(event) = handle.poll() {
            break event;
        }
        progress.set_message(format!(
            "Scanning {root} ({} directories)",
            handle.stats().dirs_visited()
        ));
        std::thread::sleep(Duration::from_millis(50));
    };
    progress.finish_and_clear();

    match event {
        ScanEvent::Complete { items, duration } => Ok((items, duration)),
        ScanEvent::Cancelled => Err(TidyError::Cancelled.into()),
        ScanEvent::Failed { message } => {
            Err(anyhow::anyhow!(message)).with_context(|| format!("Scan of {root} failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_target_overrides_config() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.scan.workers = 2;
        config.scan.max_depth = 3;

        let args = TargetArgs {
            path: tmp.path().to_path_buf(),
            jobs: Some(5),
            max_depth: Some(0),
            ..TargetArgs::default()
        };
        let target = prepare_target(&args, &config).unwrap();

        assert_eq!(target.options.workers, 5);
        assert_eq!(target.options.max_depth, None);
    }

    #[test]
    fn test_prepare_target_keeps_config_without_flags() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.scan.max_depth = 3;

        let args = TargetArgs {
            path: tmp.path().to_path_buf(),
            ..TargetArgs::default()
        };
        let target = prepare_target(&args, &config).unwrap();

        assert_eq!(target.options.max_depth, Some(3));
    }

    #[test]
    fn test_prepare_target_rejects_missing_gitignore() {
        let tmp = TempDir::new().unwrap();
        let args = TargetArgs {
            path: tmp.path().to_path_buf(),
            gitignore: true,
            ..TargetArgs::default()
        };

        let err = prepare_target(&args, &Config::default()).err().unwrap();
        assert!(matches!(err, TidyError::GitignoreMissing(_)));
    }

    #[test]
    fn test_run_scan_collects_items() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("app/node_modules/x")).unwrap();
        fs::write(tmp.path().join("app/node_modules/x/index.js"), "x").unwrap();

        let args = TargetArgs {
            path: tmp.path().to_path_buf(),
            ..TargetArgs::default()
        };
        let target = prepare_target(&args, &Config::default()).unwrap();
        let (items, _) = run_scan(&target, &CancellationToken::new(), false).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, "Node.js dependencies");
    }

    #[test]
    fn test_run_scan_cancelled() {
        let tmp = TempDir::new().unwrap();
        let args = TargetArgs {
            path: tmp.path().to_path_buf(),
            ..TargetArgs::default()
        };
        let target = prepare_target(&args, &Config::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run_scan(&target, &cancel, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TidyError>(),
            Some(TidyError::Cancelled)
        ));
    }
}
