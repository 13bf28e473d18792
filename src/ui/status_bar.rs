use ratatui::{prelude::*, widgets::Paragraph};

use super::format_size;
use crate::app::{App, AppMode};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // If there's a status message, show it prominently
    if let Some(ref message) = app.status_message {
        let line = Line::from(vec![Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Yellow).bg(Color::DarkGray),
        )]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let position = if app.images.is_empty() {
        "0/0".to_string()
    } else {
        format!("{}/{}", app.selected_index + 1, app.images.len())
    };

    let mut spans = vec![
        Span::styled(
            " mememanager ",
            Style::default().fg(Color::White).bg(Color::DarkGray),
        ),
        Span::styled(
            format!(
                " {} images, {} tags | {} files, {} ",
                app.stats.image_count,
                app.stats.tag_count,
                app.storage.file_count,
                format_size(app.storage.total_bytes)
            ),
            Style::default().fg(Color::Gray),
        ),
    ];

    let help_text = match app.mode {
        AppMode::Searching => format!(" {} | Enter:keep Esc:clear ", position),
        _ => format!(" {} | i:import p:paste t:tags /:search ?:help q:quit ", position),
    };

    let content_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let help_len = help_text.chars().count();
    let available = area.width as usize;
    if available > content_len + help_len {
        spans.push(Span::raw(" ".repeat(available - content_len - help_len)));
    }

    spans.push(Span::styled(
        help_text,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
