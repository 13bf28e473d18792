use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::input_line;
use crate::app::{App, AppMode, ImageEntry};

/// The library list, with the search box above it while a query is active.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app.mode == AppMode::Searching;
    let list_area = if searching || !app.query.is_empty() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        render_search(frame, app, searching, chunks[0]);
        chunks[1]
    } else {
        area
    };

    let title = if app.query.is_empty() {
        format!(" Memes ({}) ", app.images.len())
    } else {
        format!(" Results ({}) ", app.images.len())
    };

    if app.images.is_empty() {
        let hint = if app.query.is_empty() {
            "Library is empty. Press i to import, or paste / drop files."
        } else {
            "No matches"
        };
        let empty = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(empty, list_area);
        return;
    }

    let items: Vec<ListItem> = app.images.iter().map(entry_to_list_item).collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(app.selected_index));

    frame.render_stateful_widget(list, list_area, &mut state);
}

fn render_search(frame: &mut Frame, app: &App, active: bool, area: Rect) {
    let border_color = if active { Color::Yellow } else { Color::DarkGray };
    let content = if active {
        input_line(&app.query)
    } else {
        Line::from(app.query.value())
    };
    let search = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Search "),
    );
    frame.render_widget(search, area);
}

fn entry_to_list_item(entry: &ImageEntry) -> ListItem<'static> {
    let mut spans = vec![Span::styled(
        format!(" {}", entry.record.original_name),
        Style::default().fg(Color::Green),
    )];

    if !entry.tags.is_empty() {
        let names: Vec<&str> = entry.tags.iter().map(|t| t.name.as_str()).collect();
        spans.push(Span::styled(
            format!("  [{}]", names.join(", ")),
            Style::default().fg(Color::Cyan),
        ));
    }

    ListItem::new(Line::from(spans))
}
