//! Session identity header.

use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};
use stuart_engine::SessionAddress;
use unicode_width::UnicodeWidthStr;

/// One-line header naming the session and the address it lives at.
pub struct IdentityHeader<'a> {
    address: Option<&'a SessionAddress>,
}

impl<'a> IdentityHeader<'a> {
    pub fn new(address: Option<&'a SessionAddress>) -> Self {
        Self { address }
    }
}

impl Widget for IdentityHeader<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }
        buf.set_style(area, Styles::default());

        let Some(address) = self.address else {
            let line = Line::from(vec![
                Span::styled(" stuart ", Styles::title()),
                Span::styled("no session", Styles::dim()),
            ]);
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        };

        let line = Line::from(vec![
            Span::styled(" stuart ", Styles::title()),
            Span::styled("session ", Styles::dim()),
            Span::styled(address.token().to_string(), Styles::active()),
        ]);
        let used = line.width();
        buf.set_line(area.x, area.y, &line, area.width);

        // Full address on the right when it fits
        let url = address.to_string();
        let url_width = url.width() + 1;
        if used + url_width + 1 <= usize::from(area.width) {
            let x = area.x + area.width - url_width as u16;
            buf.set_string(x, area.y, &url, Styles::dim());
        }
    }
}
