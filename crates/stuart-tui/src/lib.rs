//! stuart-tui: Terminal UI for the stuart conversational client
//!
//! This crate provides the TUI layer for stuart, including:
//! - The session screen (transcript, wait animation, question input)
//! - The blocking notice shown when a session fails
//! - Shared widgets (status bar, text input)

mod app;
mod event;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod text;
mod ui;

use screens::Screen as ScreenTrait;

pub use app::App;
pub use event::{Action, Event, EventHandler};
pub use stuart_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::sync::Arc;
use stuart_engine::{
    create_session, open_session, start_session, Backend, Config, HttpBackend, SessionAddress,
    SessionError, SessionHandle, Timings,
};
use tokio::sync::mpsc;
use tracing::{error, info};

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen,
            ShowCursor
        );
    }
}

/// What the TUI should open.
#[derive(Debug, Clone, Default)]
pub struct TuiOptions {
    /// Session address to join; a fresh session is created when absent.
    pub address: Option<String>,
    pub config: Config,
}

/// Run the TUI application.
///
/// Sets up the terminal, joins or creates a session, runs the event loop
/// and restores the terminal on exit.
pub async fn run_tui(options: TuiOptions) -> Result<(), Box<dyn std::error::Error>> {
    let TuiOptions { address, config } = options;

    // A joined session talks to the host it was found on
    let root = match address.as_deref().map(SessionAddress::resolve) {
        Some(Ok(resolved)) => resolved.root(),
        _ => config.base_url()?,
    };
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(root, config.connect_timeout())?);
    let timings = config.timings();

    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let mut app = App::new();
    connect(&mut app, &backend, address.as_deref(), timings).await;

    // Create event handler (4 Hz tick rate = 250ms)
    let mut events = EventHandler::new(250);

    let result = run_loop(&mut terminal, &mut app, &mut events, &backend, timings).await;

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    result
}

/// Join `address`, or create a fresh session, and attach it to the app.
///
/// Failures end up as the fatal notice rather than an error.
async fn connect(
    app: &mut App,
    backend: &Arc<dyn Backend>,
    address: Option<&str>,
    timings: Timings,
) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let handle: Result<SessionHandle, SessionError> = match address {
        Some(address) => open_session(backend.clone(), address, timings, event_tx),
        None => create_session(backend.as_ref())
            .await
            .map(|created| start_session(backend.clone(), created, timings, event_tx)),
    };

    match handle {
        Ok(handle) => {
            info!(address = %handle.address(), "Session attached");
            app.attach(handle, event_rx);
        }
        Err(e) => {
            error!(error = %e, "Could not open session");
            app.fail(e.notice());
        }
    }
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    backend: &Arc<dyn Backend>,
    timings: Timings,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let size = terminal.size()?;
        let screen = ratatui::layout::Rect::new(0, 0, size.width, size.height);
        app.clamp_scroll(screens::session::SessionScreen::max_scroll_back(app, screen));

        terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();
            screens::session::SessionScreen.render(app, area, buf);
        })?;

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => {
                    let action = event::key_to_action(key, app.key_context());
                    app.handle_action(action);
                }
                Event::Paste(text) => app.paste(&text),
                Event::Mouse(mouse) => {
                    use crossterm::event::MouseEventKind;
                    match mouse.kind {
                        MouseEventKind::ScrollUp => app.handle_action(Action::ScrollUp),
                        MouseEventKind::ScrollDown => app.handle_action(Action::ScrollDown),
                        _ => {}
                    }
                }
                Event::Tick => {
                    app.tick();
                    app.process_session_events();
                }
                Event::Resize(_, _) => {
                    // Terminal will handle resize automatically
                }
            }
        }

        if app.restart_requested {
            info!("Opening a fresh session");
            app.reset_session_state();
            connect(app, backend, None, timings).await;
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
