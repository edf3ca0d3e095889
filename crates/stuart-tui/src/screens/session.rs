//! The session screen: identity header, transcript, wait animation, input
//! and status bar.

use super::{render_fatal_overlay, Screen};
use crate::app::App;
use crate::ui::theme::{liveness_badge, state_label, Styles};
use crate::ui::widgets::{IdentityHeader, KeyHint, StatusBar, Transcript};
use crate::ui::session_layout;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Block, Borders, Paragraph, Widget},
};
use stuart_engine::SessionState;

/// Main screen of a session.
pub struct SessionScreen;

impl SessionScreen {
    fn input_placeholder(state: SessionState) -> &'static str {
        match state {
            SessionState::Unknown => " connecting...",
            SessionState::WaitForQuestion => " ask a question",
            SessionState::QuestionSent
            | SessionState::QuestionQueued
            | SessionState::ProcessingQuestion => " waiting for the answer...",
        }
    }

    fn transcript(app: &App) -> Transcript<'_> {
        let title = if app.scroll_back > 0 {
            " Conversation (scrolled) "
        } else {
            " Conversation "
        };
        Transcript::new(&app.conversation).block(
            Block::default()
                .title(title)
                .title_style(Styles::title())
                .borders(Borders::ALL)
                .border_style(Styles::border()),
        )
    }

    /// How far the transcript can scroll back on a screen of `area`.
    pub fn max_scroll_back(app: &App, area: Rect) -> usize {
        Self::transcript(app).max_scroll_back(session_layout(area).transcript)
    }

    fn hints(app: &App) -> Vec<KeyHint> {
        if app.fatal.is_some() {
            return vec![KeyHint::new("Enter", "new session"), KeyHint::new("Esc", "quit")];
        }
        let mut hints = Vec::new();
        if app.input_enabled {
            hints.push(KeyHint::new("Enter", "send"));
            hints.push(KeyHint::new("S-Enter", "newline"));
        }
        hints.push(KeyHint::new("PgUp/PgDn", "scroll"));
        hints.push(KeyHint::new("^Y", "copy address"));
        hints.push(KeyHint::new("^C", "quit"));
        hints
    }
}

impl Screen for SessionScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Styles::default());
        let layout = session_layout(area);

        IdentityHeader::new(app.address.as_ref()).render(layout.header, buf);

        Self::transcript(app)
            .scroll_back(app.scroll_back)
            .render(layout.transcript, buf);

        let indicator = app.notification.as_deref().unwrap_or(&app.indicator);
        Paragraph::new(indicator)
            .style(Styles::indicator())
            .render(layout.indicator, buf);

        let border = if app.input_enabled {
            Styles::border_active()
        } else {
            Styles::border()
        };
        app.input
            .widget()
            .enabled(app.input_enabled)
            .placeholder(Self::input_placeholder(app.state))
            .block(
                Block::default()
                    .title(" Question ")
                    .borders(Borders::ALL)
                    .border_style(border),
            )
            .render(layout.input, buf);

        let (liveness, liveness_style) = liveness_badge(app.liveness());
        StatusBar::new(state_label(app.state))
            .hints(Self::hints(app))
            .badge("backend", liveness, liveness_style)
            .render(layout.status, buf);

        if let Some(notice) = &app.fatal {
            render_fatal_overlay(notice, area, buf);
        }
    }
}
