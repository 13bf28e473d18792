use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::path::PathBuf;

use super::input::TextInput;
use super::{centered_area, input_line};
use crate::assets::paths_from_paste;

/// Path entry for importing files or directories
#[derive(Default)]
pub struct ImportDialog {
    pub input: TextInput,
    pub error: Option<String>,
}

impl ImportDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing paths named by the input. Accepts the same forms as a paste
    /// (quoted, escaped, `file://`) plus a leading `~/`.
    pub fn paths(&self) -> Vec<PathBuf> {
        let text = self.input.value().trim();
        let expanded = match (text.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest).to_string_lossy().to_string(),
            _ => text.to_string(),
        };
        paths_from_paste(&expanded)
    }
}

pub fn render(frame: &mut Frame, dialog: &ImportDialog, area: Rect) {
    let dialog_area = centered_area(area, 70, 10);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Import ")
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Hint
            Constraint::Length(3), // Input
            Constraint::Length(1), // Error
            Constraint::Min(1),    // Footer
        ])
        .split(inner);

    let hint = Paragraph::new("Image file or directory. You can also paste or drop files here.")
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    frame.render_widget(hint, chunks[0]);

    let input = Paragraph::new(input_line(&dialog.input)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Path ")
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(input, chunks[1]);

    if let Some(ref error) = dialog.error {
        let error = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
        frame.render_widget(error, chunks[2]);
    }

    let footer = Paragraph::new("Enter:import | Esc:cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[3]);
}
