//! Multi-line text input widget.

use crate::text::wrap_text;
use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

/// A multi-line text input widget.
#[derive(Debug, Clone)]
pub struct TextInput<'a> {
    /// The text content.
    content: &'a str,
    /// Cursor position (character index).
    cursor: usize,
    /// Optional block for borders/title.
    block: Option<Block<'a>>,
    /// Whether the input accepts typing.
    enabled: bool,
    /// Placeholder text.
    placeholder: Option<&'a str>,
    /// Prompt prefix (e.g., "> ").
    prompt: &'a str,
}

impl<'a> TextInput<'a> {
    /// Create a new text input.
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            cursor: content.chars().count(),
            block: None,
            enabled: true,
            placeholder: None,
            prompt: "> ",
        }
    }

    /// Set the block for the text input.
    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Set whether the input accepts typing. Disabled inputs show no cursor.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set placeholder text.
    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner.height < 1 || inner.width < 1 {
            return;
        }

        let text_style = if self.enabled {
            Styles::default()
        } else {
            Styles::dim()
        };

        if self.content.is_empty() {
            let mut spans = vec![Span::styled(self.prompt, Styles::active())];
            if self.enabled {
                spans.push(Span::styled("_", Styles::active()));
            }
            if let Some(placeholder) = self.placeholder {
                spans.push(Span::styled(placeholder, Styles::dim()));
            }
            Paragraph::new(Line::from(spans)).render(inner, buf);
            return;
        }

        let indent = " ".repeat(self.prompt.chars().count());
        let mut lines: Vec<String> = Vec::new();
        let mut current_line = self.prompt.to_string();
        let mut cursor_drawn = false;

        for (i, ch) in self.content.chars().enumerate() {
            let at_cursor = self.enabled && !cursor_drawn && i == self.cursor;
            if ch == '\n' {
                if at_cursor {
                    current_line.push('_');
                    cursor_drawn = true;
                }
                lines.push(std::mem::replace(&mut current_line, indent.clone()));
            } else {
                if at_cursor {
                    current_line.push('|');
                    cursor_drawn = true;
                }
                current_line.push(ch);
            }
        }

        if self.enabled && !cursor_drawn {
            current_line.push('_');
        }
        lines.push(current_line);

        // Rows as displayed, so the bottom row (and the cursor) stays visible
        let width = usize::from(inner.width);
        let rows: Vec<String> = lines
            .iter()
            .flat_map(|line| wrap_text(line, width))
            .collect();
        let height = usize::from(inner.height);
        let skip = rows.len().saturating_sub(height);
        let visible: Vec<Line<'_>> = rows.into_iter().skip(skip).map(Line::from).collect();

        Paragraph::new(visible).style(text_style).render(inner, buf);
    }
}

/// State for a text input, managing content and cursor position.
///
/// The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    content: String,
    cursor: usize,
}

impl TextInputState {
    /// Create a new empty text input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Check if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Check if the content is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Clear the content.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(i, _)| i)
    }

    /// Insert a character at the cursor position.
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.content.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Delete the character at the cursor (delete).
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Move cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    /// Move cursor to start.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move cursor to end.
    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Create a widget from this state.
    pub fn widget(&self) -> TextInput<'_> {
        let mut input = TextInput::new(&self.content);
        input.cursor = self.cursor;
        input
    }
}
