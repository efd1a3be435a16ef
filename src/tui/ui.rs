//! UI rendering for the TUI.

use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
};

use super::app::{App, Mode, Phase};
use crate::scanner::{format_size, Item};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const CATEGORY_WIDTH: usize = 28;
const SIZE_WIDTH: usize = 10;

/// Render the entire UI.
pub fn render(app: &App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Items
            Constraint::Length(1), // Status
            Constraint::Length(1), // Progress / notices
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    render_header(app, frame, chunks[0]);
    match app.phase {
        Phase::Scanning => render_scanning(app, frame, chunks[1]),
        Phase::Selecting => render_items(app, frame, chunks[1]),
    }
    render_status(app, frame, chunks[2]);
    render_notice(app, frame, chunks[3]);
    render_footer(app, frame, chunks[4]);

    match app.mode {
        Mode::Filter => render_filter_overlay(app, frame),
        Mode::Confirm => render_confirm_dialog(app, frame),
        Mode::Help => render_help_overlay(frame),
        Mode::Normal => {}
    }
}

/// Spinner glyph for an animation frame.
pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER[tick % SPINNER.len()]
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let summary = match app.phase {
        Phase::Scanning => "...".to_string(),
        Phase::Selecting => format!(
            "{} item{}, {}",
            app.inventory.len(),
            if app.inventory.len() == 1 { "" } else { "s" },
            format_size(app.inventory.total_size())
        ),
    };
    let header_text = format!(" {}  │  {}", app.root.display(), summary);

    let block = Block::default()
        .title(" devtidy ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(header_text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_scanning(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let (dirs, elapsed) = app.scan_progress().unwrap_or_default();
    let text = vec![
        Line::from(""),
        Line::from(format!(
            "{} Scanning {}",
            spinner_frame(app.tick_count),
            app.root.display()
        )),
        Line::from(""),
        Line::from(format!(
            "{} directories scanned in {:.1}s",
            dirs,
            elapsed.as_secs_f64()
        ))
        .style(Style::default().fg(Color::DarkGray)),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));

    frame.render_widget(paragraph, area);
}

fn render_items(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    if app.visible.is_empty() {
        let message = if !app.filter.is_empty() {
            "No matches found"
        } else {
            "No artifacts found"
        };

        let paragraph = Paragraph::new(message)
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));

        frame.render_widget(paragraph, area);
        return;
    }

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let items = app.inventory.items();
    let max_size = items.iter().map(|i| i.size).max().unwrap_or(0);
    let visible_height = inner_area.height as usize;
    let scroll_offset = calculate_scroll_offset(app.cursor, visible_height, app.visible.len());

    for (i, &index) in app
        .visible
        .iter()
        .skip(scroll_offset)
        .take(visible_height)
        .enumerate()
    {
        let Some(item) = items.get(index) else {
            continue;
        };
        let y = inner_area.y + i as u16;
        let is_cursor = scroll_offset + i == app.cursor;
        let row = Rect::new(inner_area.x, y, inner_area.width, 1);
        render_item(app, frame, item, row, max_size, is_cursor);
    }
}

pub(crate) fn calculate_scroll_offset(selected: usize, visible_height: usize, total: usize) -> usize {
    if total <= visible_height {
        return 0;
    }

    let padding = 3.min(visible_height / 4);

    if selected < padding {
        0
    } else if selected >= total - padding {
        total.saturating_sub(visible_height)
    } else {
        selected.saturating_sub(padding)
    }
}

/// Green for small items, red for the largest.
pub(crate) fn size_color(size: u64, max_size: u64) -> Color {
    if max_size == 0 {
        return Color::Gray;
    }

    let ratio = size as f64 / max_size as f64;

    if ratio < 0.25 {
        Color::Green
    } else if ratio < 0.50 {
        Color::Yellow
    } else if ratio < 0.75 {
        Color::Rgb(255, 165, 0) // Orange
    } else {
        Color::Red
    }
}

fn render_item(app: &App, frame: &mut Frame, item: &Item, area: Rect, max_size: u64, is_cursor: bool) {
    let marker = if item.selected { "✓ " } else { "  " };

    let category = truncate(&item.category, CATEGORY_WIDTH);
    let size_str = format!("{:>width$}", format_size(item.size), width = SIZE_WIDTH);

    // marker, path, gap, category, gap, size
    let fixed = 2 + 1 + CATEGORY_WIDTH + 1 + SIZE_WIDTH;
    let path_width = (area.width as usize).saturating_sub(fixed);
    let relative = item.path.strip_prefix(&app.root).unwrap_or(&item.path);
    let path = truncate_left(&relative.display().to_string(), path_width);
    let padding = " ".repeat(path_width.saturating_sub(path.chars().count()));

    let path_style = if item.selected {
        Style::default().fg(Color::Red).bold()
    } else {
        Style::default().fg(Color::Blue).bold()
    };

    let spans = vec![
        Span::styled(marker, Style::default().fg(Color::Green).bold()),
        Span::styled(path, path_style),
        Span::raw(padding),
        Span::raw(" "),
        Span::styled(
            format!("{:<width$}", category, width = CATEGORY_WIDTH),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(size_str, Style::default().fg(size_color(item.size, max_size))),
    ];

    let mut line = Line::from(spans);
    if is_cursor {
        line = line.style(Style::default().bg(Color::DarkGray));
    }

    frame.render_widget(Paragraph::new(line), area);
}

/// Keep the head of `text`, marking a cut with `…`.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Keep the tail of `text`; the end of a path says more than its start.
fn truncate_left(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let kept: String = text.chars().skip(count - (width - 1)).collect();
    format!("…{kept}")
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let mut text = app.status_line();
    let cleaned = app.cleaned_bytes();
    if cleaned > 0 {
        text.push_str(&format!(" | Cleaned: {}", format_size(cleaned)));
    }

    let paragraph = Paragraph::new(format!(" {text}")).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    if let Some((completed, total)) = app.cleanup_progress() {
        let ratio = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .ratio(ratio.clamp(0.0, 1.0))
            .label(format!("Cleaning {completed}/{total}"));
        frame.render_widget(gauge, area);
        return;
    }

    let (text, color) = if let Some(error) = &app.last_error {
        (error.as_str(), Color::Red)
    } else if let Some(message) = &app.status_message {
        (message.as_str(), Color::Yellow)
    } else {
        ("", Color::White)
    };

    let paragraph = Paragraph::new(format!(" {text}")).style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = match app.mode {
        Mode::Normal if app.phase == Phase::Scanning => "[?] Help  [q] Quit",
        Mode::Normal => {
            "[↑↓] Navigate  [Space] Toggle  [a] All  [c] Clean  [r] Rescan  [/] Filter  [?] Help  [q] Quit"
        }
        Mode::Filter => "[Enter] Confirm  [Esc] Cancel",
        Mode::Confirm => "[y] Yes  [n] No",
        Mode::Help => "[Esc] Close",
    };

    let paragraph = Paragraph::new(hints)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn render_filter_overlay(app: &App, frame: &mut Frame) {
    let area = frame.area();

    // Position at bottom, above the status lines
    let filter_area = Rect {
        x: 2,
        y: area.height.saturating_sub(7),
        width: area.width.saturating_sub(4).min(60),
        height: 3,
    };

    frame.render_widget(Clear, filter_area);

    let block = Block::default()
        .title(" Filter ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let paragraph = Paragraph::new(format!("/{}", app.filter))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, filter_area);

    frame.set_cursor_position(Position::new(
        filter_area.x + app.filter.chars().count() as u16 + 2, // +2 for border and /
        filter_area.y + 1,
    ));
}

fn render_confirm_dialog(app: &App, frame: &mut Frame) {
    let area = frame.area();

    let dialog_width = 50u16.min(area.width.saturating_sub(4));
    let dialog_height = 7u16;
    let dialog_area = Rect {
        x: (area.width.saturating_sub(dialog_width)) / 2,
        y: (area.height.saturating_sub(dialog_height)) / 2,
        width: dialog_width,
        height: dialog_height,
    };

    frame.render_widget(Clear, dialog_area);

    let count = app.inventory.selected_count();
    let message = format!(
        "Permanently delete {} item{}?\n\nSize: {}\n\n[y]es  [n]o",
        count,
        if count == 1 { "" } else { "s" },
        format_size(app.inventory.total_selected_size())
    );

    let block = Block::default()
        .title(" Clean ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let paragraph = Paragraph::new(message)
        .block(block)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, dialog_area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let help_width = 60u16.min(area.width.saturating_sub(8));
    let help_height = 22u16.min(area.height.saturating_sub(4));
    let help_area = Rect {
        x: (area.width.saturating_sub(help_width)) / 2,
        y: (area.height.saturating_sub(help_height)) / 2,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let help_text = r#"
 NAVIGATION
 ─────────────────────────────────
 ↑/k        Move up
 ↓/j        Move down
 PgUp/PgDn  Move a page
 g          Go to top
 G          Go to bottom

 SELECTION
 ─────────────────────────────────
 Space      Toggle item
 a          Toggle all items
 c          Delete selected items
 r          Rescan (discards selection)

 VIEW
 ─────────────────────────────────
 /          Filter by path or category
 ?          Toggle this help
 q/Esc      Quit
"#;

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, help_area);
}
