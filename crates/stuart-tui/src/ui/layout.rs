//! Layout helpers for the stuart TUI.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Height of the input box, borders included.
pub const INPUT_HEIGHT: u16 = 5;

/// Areas of the session screen, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLayout {
    pub header: Rect,
    pub transcript: Rect,
    pub indicator: Rect,
    pub input: Rect,
    pub status: Rect,
}

/// Create a centered rect with fixed dimensions.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Split the screen into header, transcript, indicator, input and status bar.
pub fn session_layout(area: Rect) -> SessionLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
        ])
        .split(area);
    SessionLayout {
        header: chunks[0],
        transcript: chunks[1],
        indicator: chunks[2],
        input: chunks[3],
        status: chunks[4],
    }
}
