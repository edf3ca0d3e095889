//! Screen definitions for the stuart TUI.

pub mod session;

use crate::app::App;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};
use stuart_engine::FatalNotice;

/// Trait for screens that can be rendered.
pub trait Screen {
    /// Render the screen to the buffer.
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Render the blocking notice for a fatal session error.
#[allow(clippy::cast_possible_truncation)]
pub fn render_fatal_overlay(notice: &FatalNotice, area: Rect, buf: &mut Buffer) {
    use crate::text::wrap_text;
    use crate::ui::centered_fixed;
    use crate::ui::theme::Styles;
    use ratatui::text::Line;
    use ratatui::widgets::{Block, Borders, Clear, Paragraph};

    let width = 60.min(area.width.saturating_sub(4));
    let text_width = usize::from(width.saturating_sub(4));

    let mut lines: Vec<Line<'_>> = Vec::new();
    lines.push(Line::default());
    for line in wrap_text(&notice.to_string(), text_width) {
        lines.push(Line::styled(format!(" {line}"), Styles::default()));
    }
    lines.push(Line::default());
    lines.push(Line::styled(
        " [Enter] new session   [Esc] quit",
        Styles::dim(),
    ));

    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let overlay_area = centered_fixed(width, height, area);

    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Session error ")
        .title_style(Styles::error())
        .borders(Borders::ALL)
        .border_style(Styles::error())
        .style(Styles::default());

    Paragraph::new(lines).block(block).render(overlay_area, buf);
}
