use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use devtidy::cli::{Cli, Command};
use devtidy::commands;
use devtidy::config::Config;
use devtidy::TidyError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or_else(Command::default_command);

    // Initialize logging based on verbosity
    init_logging(cli.verbose, cli.quiet, matches!(command, Command::Tui(_)));

    match run(command, cli.config, cli.quiet) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code(&err);
            if code != 130 {
                eprintln!("Error: {err:#}");
            }
            ExitCode::from(code)
        }
    }
}

fn run(command: Command, config_path: Option<PathBuf>, quiet: bool) -> Result<()> {
    if let Command::Completions(args) = command {
        clap_complete::generate(args.shell, &mut Cli::command(), "devtidy", &mut io::stdout());
        return Ok(());
    }

    // Load configuration
    let config = Config::load(config_path.as_deref()).map_err(TidyError::from)?;
    tracing::debug!(?config, "Loaded configuration");

    // Dispatch to subcommand
    match command {
        Command::Tui(args) => {
            tracing::info!(?args, "Starting TUI");
            commands::tui::run(args, &config)
        }
        Command::Scan(args) => {
            tracing::info!(?args, "Starting scan");
            commands::scan::run(args, &config, quiet)
        }
        Command::Clean(args) => {
            tracing::info!(?args, "Starting clean");
            commands::clean::run(args, &config, quiet)
        }
        Command::Completions(_) => Ok(()),
    }
}

/// 130 for an interrupt, 5 when some deletions failed, 2 for bad input or
/// a missing target, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<TidyError>() {
        Some(TidyError::Cancelled) => 130,
        Some(TidyError::PartialFailure { .. }) => 5,
        Some(e) if e.is_precondition() => 2,
        Some(TidyError::Config(_)) => 2,
        _ => 1,
    }
}

fn init_logging(verbosity: u8, quiet: bool, tui: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet {
        "error"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("devtidy={}", level)));

    // the TUI owns the terminal, so its logs go to a file
    let layer = if tui {
        match log_file() {
            Some(file) => fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .boxed(),
            None => fmt::layer().with_writer(io::sink).boxed(),
        }
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();
}

/// `<state or cache dir>/devtidy/devtidy.log`, opened for appending.
fn log_file() -> Option<File> {
    let dir = dirs::state_dir().or_else(dirs::cache_dir)?.join("devtidy");
    fs::create_dir_all(&dir).ok()?;
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("devtidy.log"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devtidy::error::ConfigError;

    #[test]
    fn test_exit_code_mapping() {
        let code = |err: TidyError| exit_code(&anyhow::Error::from(err));

        assert_eq!(code(TidyError::Cancelled), 130);
        assert_eq!(code(TidyError::PartialFailure { failed: 1, total: 3 }), 5);
        assert_eq!(code(TidyError::NoSelection), 2);
        assert_eq!(code(TidyError::Config(ConfigError::Invalid("x".into()))), 2);
        assert_eq!(code(TidyError::Thread(io::Error::other("spawn"))), 1);
    }

    #[test]
    fn test_exit_code_survives_context() {
        let err = anyhow::Error::from(TidyError::PartialFailure { failed: 2, total: 2 })
            .context("cleaning /work");
        assert_eq!(exit_code(&err), 5);
        assert_eq!(exit_code(&anyhow::anyhow!("plain failure")), 1);
    }
}
