//! UI module for the stuart TUI.

pub mod layout;
pub mod theme;
pub mod widgets;

pub use layout::{centered_fixed, session_layout};
