//! Dialog for managing tags on an image.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use super::{centered_area, input_line};
use super::input::TextInput;
use crate::db::Tag;

/// Dialog state for tagging an image
pub struct TagDialog {
    pub image_id: i64,
    /// Display name shown in the title
    pub image_name: String,
    /// Tags currently on this image
    pub current_tags: Vec<Tag>,
    /// Every tag in the library
    pub all_tags: Vec<Tag>,
    /// `all_tags` filtered by the input, minus tags already applied
    pub suggestions: Vec<Tag>,
    pub input: TextInput,
    pub selected_index: usize,
    pub mode: TagDialogMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagDialogMode {
    /// Viewing current tags, can remove
    ViewTags,
    /// Typing a tag to add
    AddTag,
}

impl TagDialog {
    pub fn new(image_id: i64, image_name: String, current_tags: Vec<Tag>, all_tags: Vec<Tag>) -> Self {
        Self {
            image_id,
            image_name,
            current_tags,
            all_tags,
            suggestions: Vec::new(),
            input: TextInput::new(),
            selected_index: 0,
            mode: TagDialogMode::ViewTags,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        self.input.insert(c);
        self.update_suggestions();
    }

    pub fn backspace(&mut self) {
        self.input.backspace();
        self.update_suggestions();
    }

    pub fn update_suggestions(&mut self) {
        let lower = self.input.value().trim().to_lowercase();
        let applied = &self.current_tags;
        self.suggestions = self
            .all_tags
            .iter()
            .filter(|t| !applied.iter().any(|c| c.id == t.id))
            .filter(|t| lower.is_empty() || t.name.to_lowercase().contains(&lower))
            .cloned()
            .collect();
        self.selected_index = 0;
    }

    pub fn selected_suggestion(&self) -> Option<&Tag> {
        self.suggestions.get(self.selected_index)
    }

    pub fn selected_current_tag(&self) -> Option<&Tag> {
        self.current_tags.get(self.selected_index)
    }

    /// Copy the highlighted suggestion into the input.
    pub fn complete(&mut self) {
        if let Some(name) = self.selected_suggestion().map(|t| t.name.clone()) {
            self.input = TextInput::with_text(&name);
            self.update_suggestions();
        }
    }

    /// Name to add on Enter: the typed text, or the highlighted suggestion
    /// when nothing was typed.
    pub fn tag_to_add(&self) -> Option<String> {
        let typed = self.input.value().trim();
        if !typed.is_empty() {
            Some(typed.to_string())
        } else {
            self.selected_suggestion().map(|t| t.name.clone())
        }
    }

    pub fn move_down(&mut self) {
        let len = match self.mode {
            TagDialogMode::ViewTags => self.current_tags.len(),
            TagDialogMode::AddTag => self.suggestions.len(),
        };
        if self.selected_index < len.saturating_sub(1) {
            self.selected_index += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn enter_add_mode(&mut self) {
        self.mode = TagDialogMode::AddTag;
        self.input.clear();
        self.update_suggestions();
    }

    pub fn enter_view_mode(&mut self) {
        self.mode = TagDialogMode::ViewTags;
        self.selected_index = 0;
    }

    /// Replace the tag lists after a change, keeping the selection in range.
    pub fn set_tags(&mut self, current_tags: Vec<Tag>, all_tags: Vec<Tag>) {
        self.current_tags = current_tags;
        self.all_tags = all_tags;
        if self.selected_index >= self.current_tags.len() {
            self.selected_index = self.current_tags.len().saturating_sub(1);
        }
    }
}

pub fn render(frame: &mut Frame, dialog: &TagDialog, area: Rect) {
    let dialog_area = centered_area(area, 50, 20);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Tags: {} ", dialog.image_name));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input / mode indicator
            Constraint::Min(5),    // Tag list
            Constraint::Length(1), // Help
        ])
        .split(inner);

    match dialog.mode {
        TagDialogMode::ViewTags => render_view_mode(frame, dialog, &chunks),
        TagDialogMode::AddTag => render_add_mode(frame, dialog, &chunks),
    }
}

fn tag_list<'a>(tags: &'a [Tag], title: &'a str) -> List<'a> {
    let items: Vec<ListItem> = tags
        .iter()
        .map(|tag| ListItem::new(format!("  {} ", tag.name)))
        .collect();

    List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )
}

fn render_view_mode(frame: &mut Frame, dialog: &TagDialog, chunks: &[Rect]) {
    let mode_text = Paragraph::new("Current tags").style(Style::default().fg(Color::Yellow));
    frame.render_widget(mode_text, chunks[0]);

    if dialog.current_tags.is_empty() {
        let empty = Paragraph::new("No tags assigned")
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .block(Block::default().borders(Borders::ALL).title(" Tags "));
        frame.render_widget(empty, chunks[1]);
    } else {
        let mut state = ListState::default();
        state.select(Some(dialog.selected_index));
        frame.render_stateful_widget(tag_list(&dialog.current_tags, " Tags "), chunks[1], &mut state);
    }

    let help = Paragraph::new("j/k:navigate | a:add | d:remove | Esc:close")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[2]);
}

fn render_add_mode(frame: &mut Frame, dialog: &TagDialog, chunks: &[Rect]) {
    let input = Paragraph::new(input_line(&dialog.input))
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title(" Add Tag "));
    frame.render_widget(input, chunks[0]);

    if dialog.suggestions.is_empty() {
        let text = if dialog.input.is_empty() {
            "Type a tag name".to_string()
        } else {
            format!("Press Enter to create tag: \"{}\"", dialog.input.value().trim())
        };
        let msg = Paragraph::new(text)
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(" Suggestions "));
        frame.render_widget(msg, chunks[1]);
    } else {
        let mut state = ListState::default();
        state.select(Some(dialog.selected_index));
        frame.render_stateful_widget(tag_list(&dialog.suggestions, " Suggestions "), chunks[1], &mut state);
    }

    let help = Paragraph::new("↑/↓:select | Tab:complete | Enter:add | Esc:back")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
        }
    }

    fn dialog() -> TagDialog {
        TagDialog::new(
            1,
            "cat.png".to_string(),
            vec![tag(1, "funny")],
            vec![tag(1, "funny"), tag(2, "cats"), tag(3, "Classic")],
        )
    }

    #[test]
    fn test_suggestions_filter_and_skip_applied() {
        let mut d = dialog();
        d.enter_add_mode();
        let names: Vec<_> = d.suggestions.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["cats", "Classic"]);

        d.handle_char('c');
        d.handle_char('l');
        let names: Vec<_> = d.suggestions.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Classic"]);
    }

    #[test]
    fn test_tag_to_add_prefers_typed_text() {
        let mut d = dialog();
        d.enter_add_mode();
        assert_eq!(d.tag_to_add().as_deref(), Some("cats"));

        d.handle_char('c');
        d.handle_char('a');
        assert_eq!(d.tag_to_add().as_deref(), Some("ca"));

        d.complete();
        assert_eq!(d.input.value(), "cats");
    }

    #[test]
    fn test_set_tags_clamps_selection() {
        let mut d = dialog();
        d.selected_index = 0;
        d.set_tags(Vec::new(), Vec::new());
        assert_eq!(d.selected_index, 0);
        assert!(d.selected_current_tag().is_none());
    }
}
