//! Interactive selection and cleanup of artifacts.

pub mod app;
pub mod event;
pub mod ui;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::scanner::{Classifier, WalkOptions};

pub use app::{App, Mode, Phase};

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Restores the terminal when dropped, including on early returns.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(err) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Run the TUI until the user quits.
///
/// Scanning starts immediately. On exit any running cleanup is cancelled and
/// waited for, so no deletion is cut short mid-item.
pub fn run(
    classifier: Classifier,
    walk_options: WalkOptions,
    pacing: Duration,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    let mut app = App::new(classifier, walk_options, pacing);
    app.start_scan();

    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let result = main_loop(&mut terminal, &mut app, tick_rate);

    app.finish_pending();
    drop(guard);
    terminal.show_cursor()?;

    if let Some(message) = &app.status_message {
        tracing::info!(%message, "TUI closed");
    }
    result
}

fn main_loop(
    terminal: &mut CrosstermTerminal,
    app: &mut App,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;
        event::handle_events(app, tick_rate)?;
        app.tick();
    }
    Ok(())
}
