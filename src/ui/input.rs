//! Single-line text field shared by the dialogs.

/// Editable text with a cursor counted in characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field pre-filled with `text`, cursor at the end.
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index();
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars().filter(|c| !c.is_control()) {
            self.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.text.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_index();
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.text.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Text split at the cursor, for rendering.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.text.split_at(self.byte_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_text() {
        let mut input = TextInput::with_text("café");
        assert_eq!(input.cursor(), 4);

        input.backspace();
        assert_eq!(input.value(), "caf");
        input.insert('è');
        input.move_home();
        input.insert('¡');
        assert_eq!(input.value(), "¡cafè");

        input.move_right();
        input.delete();
        assert_eq!(input.value(), "¡cfè");
        assert_eq!(input.split_at_cursor(), ("¡c", "fè"));
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut input = TextInput::new();
        input.backspace();
        input.delete();
        input.move_left();
        input.move_right();
        assert_eq!(input.cursor(), 0);

        input.insert_str("ab\ncd");
        assert_eq!(input.value(), "abcd");
        input.move_end();
        input.move_right();
        assert_eq!(input.cursor(), 4);

        input.clear();
        assert!(input.is_empty());
    }
}
