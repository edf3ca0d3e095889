//! Status bar widget.

use crate::ui::theme::{Palette, Styles};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

/// A key hint for the status bar.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: &'static str,
    pub label: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// Status bar widget displayed at the bottom of the screen.
#[derive(Debug, Clone)]
pub struct StatusBar<'a> {
    mode: &'a str,
    hints: Vec<KeyHint>,
    badge: Option<(&'a str, &'a str, Style)>,
}

impl<'a> StatusBar<'a> {
    /// Create a new status bar.
    pub fn new(mode: &'a str) -> Self {
        Self {
            mode,
            hints: Vec::new(),
            badge: None,
        }
    }

    /// Add key hints.
    #[must_use]
    pub fn hints(mut self, hints: Vec<KeyHint>) -> Self {
        self.hints = hints;
        self
    }

    /// Set a right-aligned `caption: value` badge.
    #[must_use]
    pub fn badge(mut self, caption: &'a str, value: &'a str, style: Style) -> Self {
        self.badge = Some((caption, value, style));
        self
    }
}

impl Widget for StatusBar<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        // Fill background with status bar color
        for x in area.x..area.x.saturating_add(area.width) {
            buf[(x, area.y)].set_char(' ').set_bg(Palette::STATUS_BG);
        }

        let mut spans = Vec::new();

        spans.push(Span::styled(
            format!(" {} ", self.mode),
            Styles::default().bg(Palette::ACCENT).fg(Palette::BG),
        ));
        spans.push(Span::styled(" ", Styles::status_bar()));

        for hint in &self.hints {
            spans.push(Span::styled(format!(" {} ", hint.key), Styles::key_hint()));
            spans.push(Span::styled(
                format!(" {} ", hint.label),
                Styles::key_label(),
            ));
        }

        let left_line = Line::from(spans);
        buf.set_line(area.x, area.y, &left_line, area.width);

        // The badge wins over hints when space runs out
        if let Some((caption, value, style)) = self.badge {
            let caption = format!("{caption}: ");
            let width = (caption.width() + value.width() + 1) as u16;
            if width < area.width {
                let x = area.x + area.width - width;
                let badge = Line::from(vec![
                    Span::styled(caption, Styles::status_bar()),
                    Span::styled(value, style),
                    Span::styled(" ", Styles::status_bar()),
                ]);
                buf.set_line(x, area.y, &badge, width);
            }
        }
    }
}
