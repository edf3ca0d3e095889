//! Application state and update logic for the stuart TUI.

use crate::event::{Action, KeyContext};
use crate::ui::widgets::TextInputState;
use stuart_engine::{
    Conversation, FatalNotice, HeartbeatReading, Liveness, SessionAddress, SessionEvent,
    SessionHandle, SessionState,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Lines moved by PageUp/PageDown.
const PAGE_LINES: usize = 10;

/// Ticks a notification stays visible (250ms ticks).
const NOTIFICATION_TICKS: usize = 12;

/// Application state.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default)]
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,

    /// The user confirmed the fatal notice; a fresh session is wanted.
    pub restart_requested: bool,

    /// Address of the current session.
    pub address: Option<SessionAddress>,

    /// Last state reported by the session.
    pub state: SessionState,

    /// Question being typed.
    pub input: TextInputState,

    /// Whether the input accepts typing and submission.
    pub input_enabled: bool,

    /// Transcript from the last full sync.
    pub conversation: Conversation,

    /// Transcript lines scrolled up from the bottom (0 = following).
    pub scroll_back: usize,

    /// Current wait animation frame.
    pub indicator: String,

    /// Last heartbeat reading.
    pub heartbeat: Option<HeartbeatReading>,

    /// Fatal notice blocking the screen.
    pub fatal: Option<FatalNotice>,

    /// Temporary notification message.
    pub notification: Option<String>,
    notification_ttl: usize,

    /// Tick counter.
    pub tick: usize,

    session: Option<SessionHandle>,
    session_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl App {
    /// Create an app with no session attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a running session, replacing any previous one.
    pub fn attach(&mut self, handle: SessionHandle, rx: mpsc::UnboundedReceiver<SessionEvent>) {
        self.reset_session_state();
        self.address = Some(handle.address().clone());
        self.session = Some(handle);
        self.session_rx = Some(rx);
    }

    /// Show a fatal notice for a failure outside a running session.
    pub fn fail(&mut self, notice: FatalNotice) {
        self.input_enabled = false;
        self.indicator.clear();
        self.fatal = Some(notice);
    }

    /// Drop the current session before opening a fresh one.
    pub fn reset_session_state(&mut self) {
        self.session = None;
        self.session_rx = None;
        self.address = None;
        self.state = SessionState::Unknown;
        self.input.clear();
        self.input_enabled = false;
        self.conversation = Conversation::default();
        self.scroll_back = 0;
        self.indicator.clear();
        self.heartbeat = None;
        self.fatal = None;
        self.restart_requested = false;
    }

    /// Liveness for the badge; unknown until the first check completes.
    pub fn liveness(&self) -> Liveness {
        self.heartbeat
            .as_ref()
            .map_or(Liveness::Unknown, |reading| reading.liveness)
    }

    /// Context for mapping keys to actions.
    pub fn key_context(&self) -> KeyContext {
        KeyContext {
            modal: self.fatal.is_some(),
            input_enabled: self.input_enabled,
            input_empty: self.input.is_empty(),
        }
    }

    /// Handle an action.
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Confirm => {
                if self.fatal.is_some() {
                    self.restart_requested = true;
                }
            }
            Action::Submit => {
                self.submit_input();
            }
            Action::Newline => self.edit(|input| input.insert('\n')),
            Action::Insert(c) => self.edit(|input| input.insert(c)),
            Action::Backspace => self.edit(TextInputState::backspace),
            Action::Delete => self.edit(TextInputState::delete),
            Action::Left => self.edit(TextInputState::move_left),
            Action::Right => self.edit(TextInputState::move_right),
            Action::Home => self.edit(TextInputState::move_home),
            Action::End => self.edit(TextInputState::move_end),
            Action::ScrollUp => self.scroll_up(1),
            Action::ScrollDown => self.scroll_down(1),
            Action::PageUp => self.scroll_up(PAGE_LINES),
            Action::PageDown => self.scroll_down(PAGE_LINES),
            Action::CopyAddress => self.copy_address(),
            Action::Refresh => {
                if let Some(session) = &self.session {
                    session.refresh();
                }
            }
            Action::None => {}
        }
    }

    /// Insert pasted text into the input.
    pub fn paste(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n");
        self.edit(|input| input.insert_str(&text));
    }

    fn edit(&mut self, f: impl FnOnce(&mut TextInputState)) {
        if self.input_enabled && self.fatal.is_none() {
            f(&mut self.input);
        }
    }

    /// Send the input as a question if the session is waiting for one.
    ///
    /// Returns whether a submission was handed to the session. The input is
    /// disabled right away; the session clears it once the answer is in.
    pub fn submit_input(&mut self) -> bool {
        if self.fatal.is_some()
            || !self.input_enabled
            || self.state != SessionState::WaitForQuestion
            || self.input.is_blank()
        {
            return false;
        }
        let Some(session) = &self.session else {
            return false;
        };

        if session.submit(self.input.content()) {
            self.input_enabled = false;
            true
        } else {
            warn!("Session is gone, dropping submission");
            false
        }
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    /// Keep `scroll_back` within what the transcript can actually scroll.
    pub fn clamp_scroll(&mut self, max_scroll_back: usize) {
        self.scroll_back = self.scroll_back.min(max_scroll_back);
    }

    fn copy_address(&mut self) {
        let Some(address) = &self.address else {
            return;
        };
        let text = address.to_string();
        let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        match result {
            Ok(()) => self.set_notification("Session address copied".to_string()),
            Err(e) => {
                debug!(error = %e, "Clipboard unavailable");
                self.set_notification(format!("Could not copy address: {e}"));
            }
        }
    }

    /// Set a temporary notification message.
    fn set_notification(&mut self, msg: String) {
        self.notification = Some(msg);
        self.notification_ttl = NOTIFICATION_TICKS;
    }

    /// Increment tick counter and update time-based state.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        if self.notification_ttl > 0 {
            self.notification_ttl -= 1;
            if self.notification_ttl == 0 {
                self.notification = None;
            }
        }
    }

    /// Process any pending session events.
    pub fn process_session_events(&mut self) {
        // Collect events first to avoid borrow issues
        let events: Vec<SessionEvent> = {
            let Some(rx) = &mut self.session_rx else {
                return;
            };
            let mut events = Vec::new();
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
            events
        };

        for event in events {
            self.handle_session_event(event);
        }
    }

    /// Handle a single session event.
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TranscriptReplaced(conversation) => {
                self.conversation = conversation;
            }
            SessionEvent::StateChanged(state) => self.state = state,
            SessionEvent::InputEnabled(enabled) => self.input_enabled = enabled,
            SessionEvent::InputCleared => self.input.clear(),
            SessionEvent::ScrollToBottom => self.scroll_back = 0,
            SessionEvent::Liveness(reading) => self.heartbeat = Some(reading),
            SessionEvent::Indicator(frame) => self.indicator = frame,
            SessionEvent::Fatal(notice) => self.fail(notice),
        }
    }

    /// Create an app for tests, attached to nothing.
    #[cfg(test)]
    pub fn new_for_test() -> Self {
        let address = SessionAddress::resolve(
            "http://localhost:5000/session?uuid=3f2b8c1e-9a4d-4e6f-8b7a-1c2d3e4f5a6b",
        )
        .unwrap();
        Self {
            address: Some(address),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stuart_engine::{Operation, SessionError};

    fn waiting_app() -> App {
        let mut app = App::new_for_test();
        app.handle_session_event(SessionEvent::StateChanged(SessionState::WaitForQuestion));
        app.handle_session_event(SessionEvent::InputEnabled(true));
        app
    }

    #[test]
    fn test_typing_requires_enabled_input() {
        let mut app = App::new_for_test();
        app.handle_action(Action::Insert('x'));
        assert!(app.input.is_empty());

        let mut app = waiting_app();
        app.handle_action(Action::Insert('x'));
        app.handle_action(Action::Newline);
        app.handle_action(Action::Insert('y'));
        assert_eq!(app.input.content(), "x\ny");
    }

    #[test]
    fn test_blank_submit_is_a_no_op() {
        let mut app = waiting_app();
        app.paste("   \n ");
        assert!(!app.submit_input());
        assert!(app.input_enabled);
        assert_eq!(app.input.content(), "   \n ");
    }

    #[test]
    fn test_submit_requires_waiting_state() {
        let mut app = waiting_app();
        app.paste("why?");
        app.handle_session_event(SessionEvent::StateChanged(SessionState::ProcessingQuestion));
        assert!(!app.submit_input());
    }

    #[test]
    fn test_submit_without_session_is_dropped() {
        let mut app = waiting_app();
        app.paste("why?");
        assert!(!app.submit_input());
        assert!(app.input_enabled);
    }

    #[test]
    fn test_session_events_update_view() {
        let mut app = waiting_app();
        app.paste("draft");
        app.scroll_back = 7;

        app.handle_session_event(SessionEvent::TranscriptReplaced(Conversation::from_parts(
            vec!["Q1".into(), "A1".into()],
            vec!["S1".into()],
        )));
        app.handle_session_event(SessionEvent::InputCleared);
        app.handle_session_event(SessionEvent::ScrollToBottom);
        app.handle_session_event(SessionEvent::Indicator("frame".into()));

        assert_eq!(app.conversation.len(), 2);
        assert!(app.input.is_empty());
        assert_eq!(app.scroll_back, 0);
        assert_eq!(app.indicator, "frame");
        assert_eq!(app.liveness(), Liveness::Unknown);
    }

    #[test]
    fn test_fatal_blocks_input_and_confirm_requests_restart() {
        let mut app = waiting_app();
        let notice = SessionError::rejected(Operation::GetState, Some("ERROR".into())).notice();
        app.handle_session_event(SessionEvent::Fatal(notice));

        assert!(app.key_context().modal);
        assert!(!app.input_enabled);
        app.handle_action(Action::Insert('x'));
        assert!(app.input.is_empty());

        app.handle_action(Action::Confirm);
        assert!(app.restart_requested);
        assert!(!app.should_quit);

        app.reset_session_state();
        assert!(app.fatal.is_none());
        assert!(!app.restart_requested);
    }

    #[test]
    fn test_confirm_without_notice_does_nothing() {
        let mut app = waiting_app();
        app.handle_action(Action::Confirm);
        assert!(!app.restart_requested);
    }

    #[test]
    fn test_scrolling() {
        let mut app = waiting_app();
        app.handle_action(Action::PageUp);
        app.handle_action(Action::ScrollUp);
        assert_eq!(app.scroll_back, PAGE_LINES + 1);
        app.handle_action(Action::PageDown);
        app.handle_action(Action::PageDown);
        assert_eq!(app.scroll_back, 0);
    }

    #[test]
    fn test_scroll_past_top_is_clamped() {
        let mut app = waiting_app();
        for _ in 0..3 {
            app.handle_action(Action::PageUp);
            app.clamp_scroll(4);
        }
        assert_eq!(app.scroll_back, 4);

        app.handle_action(Action::ScrollDown);
        assert_eq!(app.scroll_back, 3);
        app.handle_action(Action::PageDown);
        assert_eq!(app.scroll_back, 0);
    }

    #[test]
    fn test_notification_expires() {
        let mut app = App::new_for_test();
        app.set_notification("hello".into());
        for _ in 0..NOTIFICATION_TICKS {
            assert!(app.notification.is_some());
            app.tick();
        }
        assert!(app.notification.is_none());
    }
}
