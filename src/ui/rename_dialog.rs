use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::input::TextInput;
use super::{centered_area, input_line};

/// State for renaming an image's display name
pub struct RenameDialog {
    pub image_id: i64,
    /// Name before editing
    pub current_name: String,
    pub input: TextInput,
    pub error: Option<String>,
}

impl RenameDialog {
    pub fn new(image_id: i64, current_name: &str) -> Self {
        Self {
            image_id,
            current_name: current_name.to_string(),
            input: TextInput::with_text(current_name),
            error: None,
        }
    }

    /// The trimmed new name, or an error message when it cannot be used.
    pub fn new_name(&self) -> Result<Option<String>, String> {
        let name = self.input.value().trim();
        if name.is_empty() {
            Err("Name cannot be empty".to_string())
        } else if name == self.current_name {
            Ok(None)
        } else {
            Ok(Some(name.to_string()))
        }
    }
}

pub fn render(frame: &mut Frame, dialog: &RenameDialog, area: Rect) {
    let dialog_area = centered_area(area, 60, 9);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Rename ")
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Current name
            Constraint::Length(3), // Input
            Constraint::Length(1), // Error
            Constraint::Min(1),    // Footer
        ])
        .split(inner);

    let header = Paragraph::new(format!("Current: {}", dialog.current_name))
        .style(Style::default().fg(Color::Magenta));
    frame.render_widget(header, chunks[0]);

    let input = Paragraph::new(input_line(&dialog.input)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" New name ")
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(input, chunks[1]);

    if let Some(ref error) = dialog.error {
        let error = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
        frame.render_widget(error, chunks[2]);
    }

    let footer = Paragraph::new("Enter:rename | Esc:cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[3]);
}
