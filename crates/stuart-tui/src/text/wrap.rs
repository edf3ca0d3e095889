//! Text wrapping utilities for ratatui Lines.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Wrap a plain text string to the specified width.
/// Returns a vector of wrapped lines; embedded newlines always break.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    textwrap::wrap(text, width)
        .into_iter()
        .map(std::borrow::Cow::into_owned)
        .collect()
}

/// Wrap `text` behind a styled `prefix`; continuation lines are indented
/// to the prefix width.
pub fn wrap_prefixed(
    prefix: &'static str,
    text: &str,
    width: usize,
    prefix_style: Style,
    style: Style,
) -> Vec<Line<'static>> {
    let indent = " ".repeat(prefix.width());
    let body_width = width.saturating_sub(prefix.width()).max(1);

    wrap_text(text, body_width)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let lead = if i == 0 {
                Span::styled(prefix, prefix_style)
            } else {
                Span::styled(indent.clone(), style)
            };
            Line::from(vec![lead, Span::styled(line, style)])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("hello world", 5), vec!["hello", "world"]);
        assert_eq!(wrap_text("one\ntwo", 20), vec!["one", "two"]);
        assert_eq!(wrap_text("no width", 0), vec!["no width"]);
    }

    #[test]
    fn test_wrap_text_empty_keeps_a_line() {
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_wrap_prefixed_indents_continuations() {
        let lines = wrap_prefixed(
            "Q: ",
            "what is the meaning",
            11,
            Style::default(),
            Style::default(),
        );
        assert_eq!(plain(&lines), vec!["Q: what is", "   the", "   meaning"]);
    }
}
