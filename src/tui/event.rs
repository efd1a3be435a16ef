//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::{App, Mode, Phase};

/// Rows moved by PageUp/PageDown.
const PAGE: isize = 20;

/// Poll for and handle events with a timeout.
///
/// Returns `Ok(true)` if an event was handled, `Ok(false)` if timeout expired.
pub fn handle_events(app: &mut App, timeout: Duration) -> std::io::Result<bool> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                handle_key_event(app, key);
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Handle a single key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Global keys (work in any mode)
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, key),
        Mode::Filter => handle_filter_mode(app, key),
        Mode::Confirm => handle_confirm_mode(app, key),
        Mode::Help => handle_help_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc => {
            if app.filter.is_empty() {
                app.quit();
            } else {
                app.filter.clear();
                app.rebuild_visible();
            }
        }
        KeyCode::Char('?') => app.mode = Mode::Help,
        _ if app.phase == Phase::Scanning => {}

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::Home | KeyCode::Char('g') => app.cursor_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.cursor_to_bottom(),
        KeyCode::PageUp => app.move_cursor(-PAGE),
        KeyCode::PageDown => app.move_cursor(PAGE),

        // Selection
        KeyCode::Char(' ') => app.toggle_current(),
        KeyCode::Char('a') => app.toggle_all(),

        // Actions
        KeyCode::Char('c') => app.request_cleanup(),
        KeyCode::Char('r') => app.start_scan(),
        KeyCode::Char('/') => {
            app.mode = Mode::Filter;
            app.filter.clear();
            app.rebuild_visible();
        }

        _ => {}
    }
}

fn handle_filter_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::Normal;
            app.filter.clear();
            app.rebuild_visible();
        }
        KeyCode::Enter => {
            app.mode = Mode::Normal;
        }
        KeyCode::Backspace => {
            app.filter.pop();
            app.rebuild_visible();
        }
        KeyCode::Char(c) => {
            app.filter.push(c);
            app.rebuild_visible();
        }
        _ => {}
    }
}

fn handle_confirm_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.start_cleanup();
            app.mode = Mode::Normal;
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.mode = Mode::Normal;
        }
        _ => {}
    }
}

fn handle_help_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
            app.mode = Mode::Normal;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{Classifier, Item, WalkOptions};
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app(tmp: &TempDir) -> App {
        let classifier = Classifier::builtin(tmp.path()).unwrap();
        let mut app = App::new(classifier, WalkOptions::default(), Duration::ZERO);
        let root = app.root.clone();
        app.load_items(
            vec![
                Item::new(root.join("a/node_modules"), "Node.js dependencies", 30),
                Item::new(root.join("b/target"), "Rust build artifacts", 20),
            ],
            Duration::ZERO,
        );
        app
    }

    #[test]
    fn test_quit_on_q() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_esc_clears_filter_before_quitting() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);
        app.filter = "rust".to_string();
        app.rebuild_visible();

        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(!app.should_quit);
        assert!(app.filter.is_empty());
        assert_eq!(app.visible.len(), 2);

        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_works_in_any_mode() {
        let tmp = TempDir::new().unwrap();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        for mode in [Mode::Normal, Mode::Filter, Mode::Help, Mode::Confirm] {
            let mut app = test_app(&tmp);
            app.mode = mode;
            handle_key_event(&mut app, ctrl_c);
            assert!(app.should_quit, "{mode:?}");
        }
    }

    #[test]
    fn test_navigation_keys() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);

        handle_key_event(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.cursor, 1);
        handle_key_event(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.cursor, 0);
        handle_key_event(&mut app, key(KeyCode::Char('G')));
        assert_eq!(app.cursor, 1);
        handle_key_event(&mut app, key(KeyCode::Char('g')));
        assert_eq!(app.cursor, 0);
        handle_key_event(&mut app, key(KeyCode::PageDown));
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn test_space_toggles_selection() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);

        handle_key_event(&mut app, key(KeyCode::Char(' ')));
        assert!(app.current_item().unwrap().selected);
        handle_key_event(&mut app, key(KeyCode::Char(' ')));
        assert!(!app.current_item().unwrap().selected);
    }

    #[test]
    fn test_a_toggles_all() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);

        handle_key_event(&mut app, key(KeyCode::Char('a')));
        assert_eq!(app.inventory.total_selected_size(), 50);
    }

    #[test]
    fn test_filter_mode_typing() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);

        handle_key_event(&mut app, key(KeyCode::Char('/')));
        assert_eq!(app.mode, Mode::Filter);
        for c in "node".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c)));
        }
        assert_eq!(app.filter, "node");
        assert_eq!(app.visible, vec![0]);

        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.filter, "nod");

        handle_key_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.filter, "nod");
    }

    #[test]
    fn test_filter_mode_escape_clears() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);
        app.mode = Mode::Filter;
        app.filter = "zzz".to_string();
        app.rebuild_visible();
        assert!(app.visible.is_empty());

        handle_key_event(&mut app, key(KeyCode::Esc));

        assert_eq!(app.mode, Mode::Normal);
        assert!(app.filter.is_empty());
        assert_eq!(app.visible.len(), 2);
    }

    #[test]
    fn test_clean_key_requires_selection() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);

        handle_key_event(&mut app, key(KeyCode::Char('c')));
        assert_eq!(app.mode, Mode::Normal);

        handle_key_event(&mut app, key(KeyCode::Char(' ')));
        handle_key_event(&mut app, key(KeyCode::Char('c')));
        assert_eq!(app.mode, Mode::Confirm);
    }

    #[test]
    fn test_confirm_mode_no() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);
        app.mode = Mode::Confirm;

        handle_key_event(&mut app, key(KeyCode::Char('n')));

        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.is_cleaning());
    }

    #[test]
    fn test_confirm_mode_yes_starts_cleanup() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);
        handle_key_event(&mut app, key(KeyCode::Char(' ')));
        app.mode = Mode::Confirm;

        handle_key_event(&mut app, key(KeyCode::Char('y')));

        assert_eq!(app.mode, Mode::Normal);
        assert!(app.is_cleaning());
        app.finish_pending();
    }

    #[test]
    fn test_help_mode() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);

        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert_eq!(app.mode, Mode::Help);
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_scanning_ignores_selection_keys() {
        let tmp = TempDir::new().unwrap();
        let mut app = test_app(&tmp);
        app.phase = Phase::Scanning;

        handle_key_event(&mut app, key(KeyCode::Char(' ')));
        handle_key_event(&mut app, key(KeyCode::Char('j')));

        assert_eq!(app.cursor, 0);
        assert_eq!(app.inventory.selected_count(), 0);
    }
}
