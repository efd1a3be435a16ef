//! Scan command implementation

use anyhow::Result;

use super::{interrupt_token, prepare_target, run_scan};
use crate::cli::ScanArgs;
use crate::config::Config;
use crate::scanner::{format_json, format_size, format_table, ScanReport};

/// Run the scan command
pub fn run(args: ScanArgs, config: &Config, quiet: bool) -> Result<()> {
    let target = prepare_target(&args.target, config)?;
    let cancel = interrupt_token();

    let (items, duration) = run_scan(&target, &cancel, !quiet && !args.json)?;
    let root = target.classifier.root().to_path_buf();

    if args.json {
        let report = ScanReport::new(
            root,
            target.classifier.mode(),
            items,
            duration.as_millis() as u64,
        );
        println!("{}", format_json(&report, true)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No artifacts found in {}", root.display());
        return Ok(());
    }

    print!("{}", format_table(&items, &root));

    let total: u64 = items.iter().map(|i| i.size).sum();
    println!();
    println!(
        "Total: {} in {} item{} ({:.2}s)",
        format_size(total),
        items.len(),
        if items.len() == 1 { "" } else { "s" },
        duration.as_secs_f64()
    );

    Ok(())
}
