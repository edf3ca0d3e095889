//! Event handling for the stuart TUI.

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;

/// Events that can occur in the TUI.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// A mouse event occurred.
    Mouse(MouseEvent),
    /// Text pasted in one piece.
    Paste(String),
    /// A tick event for UI updates.
    Tick,
    /// Terminal was resized.
    Resize(u16, u16),
}

/// Event handler that runs in a background task.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new event handler with the specified tick rate.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tx_clone = tx.clone();

        // Spawn blocking thread for event polling (crossterm uses blocking I/O)
        std::thread::spawn(move || {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        let event = match evt {
                            CrosstermEvent::Key(key) => Some(Event::Key(key)),
                            CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
                            CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
                            CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
                            _ => None,
                        };
                        if let Some(e) = event {
                            if tx_clone.send(e).is_err() {
                                break;
                            }
                        }
                    }
                } else if tx_clone.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Get the next event, blocking until one is available.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Key action that can be performed in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Submit the input as a question.
    Submit,
    /// Insert a line break into the input.
    Newline,
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    CopyAddress,
    Refresh,
    /// Acknowledge the fatal notice and open a fresh session.
    Confirm,
    None,
}

/// What the key map needs to know about the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyContext {
    /// The fatal notice is showing.
    pub modal: bool,
    /// The input accepts typing.
    pub input_enabled: bool,
    /// The input holds no text.
    pub input_empty: bool,
}

/// Convert a key event to an action based on context.
pub fn key_to_action(key: KeyEvent, context: KeyContext) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Check for Ctrl+C first
    if ctrl && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if context.modal {
        return match key.code {
            KeyCode::Enter => Action::Confirm,
            KeyCode::Esc => Action::Quit,
            _ => Action::None,
        };
    }

    if ctrl {
        return match key.code {
            KeyCode::Enter => Action::Newline,
            KeyCode::Char('y') => Action::CopyAddress,
            KeyCode::Char('r') => Action::Refresh,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => Action::Newline,
        KeyCode::Enter => Action::Submit,
        KeyCode::Char('y') if !context.input_enabled => Action::CopyAddress,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => Action::Insert(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::Up if context.input_empty || !context.input_enabled => Action::ScrollUp,
        KeyCode::Down if context.input_empty || !context.input_enabled => Action::ScrollDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::F(5) => Action::Refresh,
        _ => Action::None,
    }
}
