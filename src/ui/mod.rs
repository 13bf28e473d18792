mod browser;
mod dialogs;
pub mod import_dialog;
pub mod input;
pub mod preview;
pub mod rename_dialog;
mod status_bar;
pub mod tag_dialog;

use ratatui::prelude::*;

use crate::app::{App, AppMode};
use input::TextInput;

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Main layout: content area + status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    // Library list on the left, preview on the right
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(main_chunks[0]);

    browser::render(frame, app, content_chunks[0]);
    preview::render(frame, app, content_chunks[1]);
    status_bar::render(frame, app, main_chunks[1]);

    match app.mode {
        AppMode::Help => dialogs::render_help(frame, area),
        AppMode::ConfirmDelete => {
            if let Some(entry) = app.selected_image() {
                dialogs::render_confirm_delete(frame, &entry.record.original_name, area);
            }
        }
        AppMode::Importing => {
            if let Some(ref dialog) = app.import_dialog {
                import_dialog::render(frame, dialog, area);
            }
        }
        AppMode::Tagging => {
            if let Some(ref dialog) = app.tag_dialog {
                tag_dialog::render(frame, dialog, area);
            }
        }
        AppMode::Renaming => {
            if let Some(ref dialog) = app.rename_dialog {
                rename_dialog::render(frame, dialog, area);
            }
        }
        AppMode::Normal | AppMode::Searching => {}
    }
}

/// A `width` x `height` rectangle centred in `area`, shrunk to leave a margin.
pub(crate) fn centered_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Render a text field with a visible cursor.
pub(crate) fn input_line(input: &TextInput) -> Line<'_> {
    let (before, after) = input.split_at_cursor();
    Line::from(vec![
        Span::raw(before),
        Span::styled("|", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(after),
    ])
}

/// Human-readable byte count.
pub(crate) fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.1} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
