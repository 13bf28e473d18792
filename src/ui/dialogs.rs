use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::centered_area;

pub fn render_help(frame: &mut Frame, area: Rect) {
    let dialog_area = centered_area(area, 56, 28);

    // Clear the area behind the dialog
    frame.render_widget(Clear, dialog_area);

    let heading = Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan);
    let help_text = vec![
        Line::from(Span::styled("Navigation", heading)),
        Line::from(""),
        Line::from("  j / ↓      Move down"),
        Line::from("  k / ↑      Move up"),
        Line::from("  g / Home   Go to top"),
        Line::from("  G / End    Go to bottom"),
        Line::from(""),
        Line::from(Span::styled("Library", heading)),
        Line::from(""),
        Line::from("  /          Search names and tags"),
        Line::from("  Esc        Clear search"),
        Line::from("  i          Import a file or directory"),
        Line::from("  p          Import the image on the clipboard"),
        Line::from("  y          Copy the stored path to the clipboard"),
        Line::from("  t          Manage tags"),
        Line::from("  r          Rename"),
        Line::from("  d          Delete"),
        Line::from(""),
        Line::from("  Paste or drag files onto the window to import them."),
        Line::from(""),
        Line::from("  ?          Show this help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, dialog_area);
}

pub fn render_confirm_delete(frame: &mut Frame, name: &str, area: Rect) {
    let dialog_area = centered_area(area, 50, 7);
    frame.render_widget(Clear, dialog_area);

    let text = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw(" Delete "),
            Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" and its tags?"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " y:delete | n/Esc:cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Confirm Delete "),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, dialog_area);
}
