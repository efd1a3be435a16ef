use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::scanner::ScanMode;

/// devtidy - find and delete build outputs, dependency caches and temp files
#[derive(Parser, Debug)]
#[command(name = "devtidy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Defaults to `tui .`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse, select and delete artifacts interactively
    Tui(TuiArgs),

    /// List artifacts and their sizes
    Scan(ScanArgs),

    /// Delete every artifact found, after confirmation
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// The command run when none is given.
    pub fn default_command() -> Self {
        Command::Tui(TuiArgs {
            target: TargetArgs::default(),
        })
    }
}

/// Where and how to look for artifacts.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Root directory to search
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Match the root's .gitignore instead of the built-in patterns
    #[arg(long)]
    pub gitignore: bool,

    /// Walker threads (0 = auto)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Maximum depth below the root (0 = unlimited)
    #[arg(short = 'd', long, value_name = "N")]
    pub max_depth: Option<usize>,
}

impl Default for TargetArgs {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            gitignore: false,
            jobs: None,
            max_depth: None,
        }
    }
}

impl TargetArgs {
    pub fn mode(&self) -> ScanMode {
        if self.gitignore {
            ScanMode::Gitignore
        } else {
            ScanMode::Builtin
        }
    }
}

#[derive(Args, Debug)]
pub struct TuiArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show what would be deleted without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Only items whose category contains one of these (comma-separated)
    #[arg(short = 't', long = "category", value_delimiter = ',', value_name = "LIST")]
    pub categories: Option<Vec<String>>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
