//! TUI command implementation

use anyhow::Result;

use super::prepare_target;
use crate::cli::TuiArgs;
use crate::config::Config;

pub fn run(args: TuiArgs, config: &Config) -> Result<()> {
    let target = prepare_target(&args.target, config)?;
    tracing::info!(root = %target.classifier.root().display(), "Starting TUI");

    crate::tui::run(
        target.classifier,
        target.options,
        config.pacing(),
        config.tick_rate(),
    )
}
