/// Single-line query editor behind the search box. The cursor counts chars,
/// not bytes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchInput {
    text: String,
    cursor: usize,
}

impl SearchInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut buffer = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut buffer));
    }

    /// Line breaks and tabs become spaces so pasted text stays on one line.
    pub fn insert_str(&mut self, text: &str) {
        let cleaned: String = text
            .chars()
            .filter(|ch| *ch != '\r')
            .map(|ch| if ch.is_whitespace() { ' ' } else { ch })
            .filter(|ch| !ch.is_control())
            .collect();
        if cleaned.is_empty() {
            return;
        }

        let at = self.byte_offset(self.cursor);
        self.text.insert_str(at, &cleaned);
        self.cursor += cleaned.chars().count();
    }

    /// Returns whether anything was removed.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_cursor_on_multibyte_text() {
        let mut input = SearchInput::new();
        input.insert_str("añb");
        input.move_left();
        input.insert_char('é');
        assert_eq!(input.text(), "añéb");
        assert!(input.backspace());
        assert!(input.backspace());
        assert_eq!(input.text(), "ab");
        assert_eq!(input.cursor(), 1);
        assert!(input.delete_forward());
        assert_eq!(input.text(), "a");
        assert!(!input.delete_forward());
    }

    #[test]
    fn pasted_newlines_become_spaces() {
        let mut input = SearchInput::new();
        input.insert_str("fix\r\nbug\tnow");
        assert_eq!(input.text(), "fix bug now");
    }

    #[test]
    fn clear_resets_cursor() {
        let mut input = SearchInput::new();
        input.insert_str("query");
        input.clear();
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
        assert!(!input.backspace());
    }
}
