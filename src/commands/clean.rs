//! Clean command implementation.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use super::{interrupt_token, prepare_target, run_scan};
use crate::cleaner::{CleanupEvent, CleanupExecutor, InventoryStore};
use crate::cli::CleanArgs;
use crate::config::Config;
use crate::error::TidyError;
use crate::scanner::{format_size, format_table, Item};

/// Run the clean command.
pub fn run(args: CleanArgs, config: &Config, quiet: bool) -> Result<()> {
    let target = prepare_target(&args.target, config)?;
    let cancel = interrupt_token();
    let root = target.classifier.root().to_path_buf();

    if !quiet {
        println!("Scanning for artifacts in {}...", root.display());
    }
    let (items, _) = run_scan(&target, &cancel, !quiet)?;

    let found = items.len();
    let items = select_items(items, args.categories.as_deref());

    if items.is_empty() {
        if found > 0 {
            println!("Found {found} artifact(s), but none in the requested categories.");
        } else {
            println!("No artifacts found.");
        }
        return Ok(());
    }

    let mut inventory = InventoryStore::new();
    inventory.replace(items);
    inventory.set_all_selected(true);

    println!();
    print!("{}", format_table(inventory.items(), &root));
    println!(
        "\nTotal: {} in {} item{}",
        format_size(inventory.total_selected_size()),
        inventory.selected_count(),
        if inventory.selected_count() == 1 { "" } else { "s" }
    );

    if args.dry_run {
        println!("\n[DRY RUN] Nothing was deleted.");
        return Ok(());
    }

    // Confirmation
    if !args.force {
        print!("\nDelete these items permanently? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if cancel.is_cancelled() {
            return Err(TidyError::Cancelled.into());
        }
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut executor = CleanupExecutor::new(Duration::ZERO, cancel);
    let total = executor.start(&inventory)?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let mut failures = Vec::new();
    let summary = executor.wait(&mut inventory, |event| {
        if let CleanupEvent::Progress(p) = event {
            progress.set_position(p.completed as u64);
            progress.set_message(p.path.display().to_string());
            if let Some(error) = &p.error {
                failures.push((p.path.clone(), error.clone()));
            }
        }
    });
    progress.finish_and_clear();

    let Some(summary) = summary else {
        return Ok(());
    };

    // Print results
    println!("\nResults:");
    println!(
        "  Deleted: {} item{}",
        summary.succeeded,
        if summary.succeeded == 1 { "" } else { "s" }
    );
    if summary.failed > 0 {
        println!(
            "  Failed:  {} item{}",
            summary.failed,
            if summary.failed == 1 { "" } else { "s" }
        );
    }
    println!("  Freed:   {}", format_size(summary.freed_bytes));

    for (path, error) in &failures {
        eprintln!("  Error deleting {}: {}", path.display(), error);
    }

    if summary.cancelled {
        return Err(TidyError::Cancelled.into());
    }
    if summary.failed > 0 {
        return Err(TidyError::PartialFailure {
            failed: summary.failed,
            total: summary.total,
        }
        .into());
    }

    Ok(())
}

/// Keep items whose category contains any of `categories`, ignoring case.
/// `None` keeps everything.
pub fn select_items(items: Vec<Item>, categories: Option<&[String]>) -> Vec<Item> {
    let Some(categories) = categories else {
        return items;
    };
    items
        .into_iter()
        .filter(|item| matches_category(&item.category, categories))
        .collect()
}

fn matches_category(category: &str, wanted: &[String]) -> bool {
    let category = category.to_lowercase();
    wanted
        .iter()
        .map(|w| w.trim().to_lowercase())
        .any(|w| !w.is_empty() && category.contains(&w))
}
