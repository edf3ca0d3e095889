//! Transcript pane.
//!
//! ```text
//! ┌─ Conversation ──────────────────────┐
//! │ Q: What is a session token?         │
//! │ A: The UUID in the session address. │
//! │    src: protocol notes              │
//! │                                     │
//! │ Q: And the heartbeat?               │
//! └─────────────────────────────────────┘
//! ```

use crate::text::wrap_prefixed;
use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Line,
    widgets::{Block, Paragraph, Widget},
};
use stuart_engine::{BlockKind, Conversation};

pub const QUESTION_PREFIX: &str = "Q: ";
pub const ANSWER_PREFIX: &str = "A: ";
pub const SOURCE_PREFIX: &str = "   src: ";

/// Lay out a conversation as styled lines for the given width.
///
/// Each question opens an exchange; exchanges are separated by a blank line.
pub fn transcript_lines(conversation: &Conversation, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for block in conversation.blocks() {
        let (prefix, style) = match block.kind {
            BlockKind::Question => {
                if !lines.is_empty() {
                    lines.push(Line::default());
                }
                (QUESTION_PREFIX, Styles::question())
            }
            BlockKind::Answer => (ANSWER_PREFIX, Styles::answer()),
            BlockKind::Source => (SOURCE_PREFIX, Styles::source()),
        };
        lines.extend(wrap_prefixed(prefix, block.text, width, style, style));
    }
    lines
}

/// Scrollable transcript widget.
pub struct Transcript<'a> {
    conversation: &'a Conversation,
    scroll_back: usize,
    block: Option<Block<'a>>,
}

impl<'a> Transcript<'a> {
    pub fn new(conversation: &'a Conversation) -> Self {
        Self {
            conversation,
            scroll_back: 0,
            block: None,
        }
    }

    /// Lines scrolled up from the bottom.
    #[must_use]
    pub fn scroll_back(mut self, lines: usize) -> Self {
        self.scroll_back = lines;
        self
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Largest useful `scroll_back` when rendered into `area`.
    pub fn max_scroll_back(&self, area: Rect) -> usize {
        let inner = self.block.as_ref().map_or(area, |block| block.inner(area));
        if inner.height < 1 || inner.width < 1 || self.conversation.is_empty() {
            return 0;
        }
        transcript_lines(self.conversation, usize::from(inner.width))
            .len()
            .saturating_sub(usize::from(inner.height))
    }
}

impl Widget for Transcript<'_> {
    #[allow(clippy::cast_possible_truncation)]
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

        if self.conversation.is_empty() {
            Paragraph::new("No questions yet. Type one below and press Enter.")
                .style(Styles::dim())
                .render(inner, buf);
            return;
        }

        let lines = transcript_lines(self.conversation, usize::from(inner.width));
        let overflow = lines.len().saturating_sub(usize::from(inner.height));
        let offset = overflow.saturating_sub(self.scroll_back);

        Paragraph::new(lines)
            .style(Styles::default())
            .scroll((offset.min(usize::from(u16::MAX)) as u16, 0))
            .render(inner, buf);
    }
}
