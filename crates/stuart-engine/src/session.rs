//! Session runtime.
//!
//! A session is driven by three tasks:
//!
//! - the session task, which owns the state, performs full syncs, submits
//!   questions and runs the status poller,
//! - the heartbeat monitor ([`crate::heartbeat`]),
//! - the wait animation ticker ([`crate::animation`]).
//!
//! Only the session task writes the [`SessionView`]; the others read it or
//! ignore it. Everything observable is reported as a [`SessionEvent`] on an
//! unbounded channel, and the UI drives the session through a
//! [`SessionHandle`].
//!
//! # Event Channel
//! All event sends use `let _ = event_tx.send(...)`. A dropped receiver does
//! not stop the session; dropping the handle does.

use crate::animation;
use crate::conversation::Conversation;
use crate::error::{FatalNotice, Operation, SessionError};
use crate::heartbeat::{self, HeartbeatReading};
use crate::identity::{SessionAddress, SessionToken};
use crate::protocol::Backend;
use crate::state::{self, BackendState, Effect, SessionState, Transition, Trigger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Events emitted by a running session for UI observation.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A full sync replaced the transcript.
    TranscriptReplaced(Conversation),
    /// The session state changed.
    StateChanged(SessionState),
    /// Input was enabled or disabled.
    InputEnabled(bool),
    /// The input box should be emptied.
    InputCleared,
    /// The transcript should follow its bottom.
    ScrollToBottom,
    /// A heartbeat check completed.
    Liveness(HeartbeatReading),
    /// A new wait animation frame (empty when idle).
    Indicator(String),
    /// The session failed and stopped.
    Fatal(FatalNotice),
}

/// Commands the UI sends to the session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Submit a question, as typed.
    Submit(String),
    /// Run a full sync.
    Refresh,
}

/// View of the session, published by the session task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    pub state: SessionState,
    pub input_enabled: bool,
    pub fatal: Option<FatalNotice>,
}

/// Loop intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Delay between status polls.
    pub poll: Duration,
    /// Delay between heartbeat checks.
    pub heartbeat: Duration,
    /// Delay between animation frames.
    pub animation: Duration,
    /// Heartbeat age at which the backend counts as down.
    pub heartbeat_down_after: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll: Duration::from_millis(1000),
            heartbeat: Duration::from_millis(5000),
            animation: Duration::from_millis(500),
            heartbeat_down_after: Duration::from_secs(10),
        }
    }
}

/// Outcome of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Dropped without a request: not waiting, input disabled, or blank.
    Ignored,
    /// Accepted by the backend; polling starts.
    Sent,
}

/// Outcome of one status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Still busy, or an unrecognized state: poll again.
    Continue,
    /// The answer is in; stop polling and sync once.
    Answered,
    /// No question in flight; stop polling.
    Stopped,
}

/// State owned by the session task.
struct Session {
    backend: Arc<dyn Backend>,
    token: SessionToken,
    view: watch::Sender<SessionView>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    fn new(
        backend: Arc<dyn Backend>,
        token: SessionToken,
        view: watch::Sender<SessionView>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            backend,
            token,
            view,
            event_tx,
        }
    }

    fn state(&self) -> SessionState {
        self.view.borrow().state
    }

    fn input_enabled(&self) -> bool {
        self.view.borrow().input_enabled
    }

    /// Fetch state and transcript, replace the transcript, then transition.
    async fn full_sync(&mut self) -> Result<(), SessionError> {
        let operation = Operation::GetStateAndConversation;
        let reply = self
            .backend
            .get_state_and_conversation(&self.token)
            .await
            .map_err(|e| SessionError::transport(operation, e))?;
        if !reply.is_ok() {
            return Err(SessionError::rejected(operation, reply.msg));
        }

        let conversation = Conversation::from_parts(reply.conversation, reply.source);
        debug!(entries = conversation.len(), state = ?reply.state, "Full sync");
        let _ = self
            .event_tx
            .send(SessionEvent::TranscriptReplaced(conversation));

        match reply.state.as_deref().and_then(BackendState::parse) {
            Some(reported) => {
                self.apply(Trigger::Synced(reported));
            }
            None => debug!(state = ?reply.state, "Ignoring unrecognized state after sync"),
        }
        Ok(())
    }

    /// Submit `question` if the session is waiting for one.
    async fn submit(&mut self, question: String) -> Result<Submission, SessionError> {
        let state = self.state();
        if state != SessionState::WaitForQuestion
            || !self.input_enabled()
            || question.trim().is_empty()
        {
            debug!(%state, "Ignoring submission");
            return Ok(Submission::Ignored);
        }

        self.set_input_enabled(false);

        let operation = Operation::AddQuestion;
        let reply = self
            .backend
            .add_question(&self.token, &question)
            .await
            .map_err(|e| SessionError::transport(operation, e))?;
        if !reply.is_ok() {
            return Err(SessionError::rejected(operation, reply.msg));
        }

        let effects = self.apply(Trigger::QuestionAccepted);
        if effects.contains(&Effect::StartPolling) {
            Ok(Submission::Sent)
        } else {
            Ok(Submission::Ignored)
        }
    }

    /// Query the state once and transition on it.
    async fn poll(&mut self) -> Result<PollOutcome, SessionError> {
        let operation = Operation::GetState;
        let reply = self
            .backend
            .get_state(&self.token)
            .await
            .map_err(|e| SessionError::transport(operation, e))?;
        if !reply.is_ok() {
            return Err(SessionError::rejected(operation, reply.msg));
        }

        let Some(reported) = reply.state.as_deref().and_then(BackendState::parse) else {
            debug!(state = ?reply.state, "Ignoring unrecognized state from poll");
            return Ok(PollOutcome::Continue);
        };
        debug!(state = reported.as_str(), "Poll");

        let effects = self.apply(Trigger::Polled(reported));
        let outcome = if effects.contains(&Effect::FullSync) {
            PollOutcome::Answered
        } else if effects.contains(&Effect::ContinuePolling) {
            PollOutcome::Continue
        } else {
            PollOutcome::Stopped
        };
        Ok(outcome)
    }

    /// Run a transition and perform its UI effects.
    ///
    /// Returns the effects so callers can act on the polling ones. An
    /// invalid trigger is logged and leaves the state untouched.
    fn apply(&mut self, trigger: Trigger) -> Vec<Effect> {
        let current = self.state();
        let Transition { state, effects } = match state::apply(current, trigger) {
            Ok(transition) => transition,
            Err(e) => {
                warn!(error = %e, "Ignoring trigger");
                return Vec::new();
            }
        };

        if state != current {
            info!(from = %current, to = %state, "Session state changed");
        }
        self.view.send_modify(|view| view.state = state);
        let _ = self.event_tx.send(SessionEvent::StateChanged(state));

        for effect in &effects {
            match effect {
                Effect::ClearInput => {
                    let _ = self.event_tx.send(SessionEvent::InputCleared);
                }
                Effect::EnableInput => self.set_input_enabled(true),
                Effect::DisableInput => self.set_input_enabled(false),
                Effect::ScrollToBottom => {
                    let _ = self.event_tx.send(SessionEvent::ScrollToBottom);
                }
                Effect::StartPolling
                | Effect::ContinuePolling
                | Effect::StopPolling
                | Effect::FullSync => {}
            }
        }
        effects
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.view.send_modify(|view| view.input_enabled = enabled);
        let _ = self.event_tx.send(SessionEvent::InputEnabled(enabled));
    }

    /// Run until the command channel closes or a fatal error occurs.
    async fn drive(
        &mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        poll_interval: Duration,
    ) -> Result<(), SessionError> {
        self.full_sync().await?;

        let mut next_poll: Option<Instant> = None;
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Submit(question)) => {
                        if self.submit(question).await? == Submission::Sent {
                            next_poll = Some(Instant::now());
                        }
                    }
                    Some(SessionCommand::Refresh) => self.full_sync().await?,
                    None => return Ok(()),
                },
                () = sleep_until(next_poll.unwrap_or_else(Instant::now)), if next_poll.is_some() => {
                    next_poll = match self.poll().await? {
                        PollOutcome::Continue => Some(Instant::now() + poll_interval),
                        PollOutcome::Answered => {
                            self.full_sync().await?;
                            None
                        }
                        PollOutcome::Stopped => None,
                    };
                }
            }
        }
    }

    /// Drive the session; on a fatal error stop the companion loops and
    /// report it exactly once.
    async fn run(
        mut self,
        commands: mpsc::UnboundedReceiver<SessionCommand>,
        poll_interval: Duration,
        companions: Vec<AbortHandle>,
    ) {
        if let Err(e) = self.drive(commands, poll_interval).await {
            for companion in &companions {
                companion.abort();
            }

            let notice = e.notice();
            error!(error = %e, "Session failed");
            self.view.send_modify(|view| {
                view.input_enabled = false;
                view.fatal = Some(notice.clone());
            });
            let _ = self.event_tx.send(SessionEvent::Fatal(notice));
        }
    }
}

/// Handle to a running session.
///
/// Dropping it stops every task of the session.
#[derive(Debug)]
pub struct SessionHandle {
    address: SessionAddress,
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    view: watch::Receiver<SessionView>,
    main: JoinHandle<()>,
    companions: Vec<JoinHandle<()>>,
}

impl SessionHandle {
    /// Submit a question. Returns false if the session has stopped.
    pub fn submit(&self, question: impl Into<String>) -> bool {
        self.command_tx
            .send(SessionCommand::Submit(question.into()))
            .is_ok()
    }

    /// Request a full sync. Returns false if the session has stopped.
    pub fn refresh(&self) -> bool {
        self.command_tx.send(SessionCommand::Refresh).is_ok()
    }

    /// Current snapshot.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.view.borrow().state
    }

    /// Subscribe to view updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    pub fn address(&self) -> &SessionAddress {
        &self.address
    }

    /// Whether the session task has ended (fatal error or shutdown).
    pub fn is_finished(&self) -> bool {
        self.main.is_finished()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.main.abort();
        for task in &self.companions {
            task.abort();
        }
    }
}

/// Start a session at an already resolved address.
///
/// Must be called from within a tokio runtime. The heartbeat monitor and the
/// animation ticker fire immediately; the session task starts with a full
/// sync.
pub fn start_session(
    backend: Arc<dyn Backend>,
    address: SessionAddress,
    timings: Timings,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) -> SessionHandle {
    let (view_tx, view_rx) = watch::channel(SessionView::default());
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    info!(token = %address.token(), "Starting session");

    let heartbeat = tokio::spawn(heartbeat::run_monitor(
        backend.clone(),
        timings.heartbeat,
        timings.heartbeat_down_after,
        event_tx.clone(),
    ));
    let animation = tokio::spawn(animation::run_ticker(
        view_rx.clone(),
        timings.animation,
        event_tx.clone(),
    ));

    let session = Session::new(backend, *address.token(), view_tx, event_tx);
    let companions = vec![heartbeat.abort_handle(), animation.abort_handle()];
    let main = tokio::spawn(session.run(command_rx, timings.poll, companions));

    SessionHandle {
        address,
        command_tx,
        view: view_rx,
        main,
        companions: vec![heartbeat, animation],
    }
}

/// Resolve `address` and start a session there.
///
/// An address without a valid token fails before any request is made.
pub fn open_session(
    backend: Arc<dyn Backend>,
    address: &str,
    timings: Timings,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) -> Result<SessionHandle, SessionError> {
    let address = SessionAddress::resolve(address)?;
    Ok(start_session(backend, address, timings, event_tx))
}

/// Ask the backend for a fresh session.
pub async fn create_session(backend: &dyn Backend) -> Result<SessionAddress, SessionError> {
    let address = backend
        .new_session()
        .await
        .map_err(|e| SessionError::transport(Operation::NewSession, e))?;
    info!(address = %address, "Created session");
    Ok(address)
}

/// A session as seen by a single full sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Parsed backend state, if recognized.
    pub state: Option<BackendState>,
    /// State string exactly as the backend sent it.
    pub raw_state: Option<String>,
    pub conversation: Conversation,
}

/// Run one full sync without starting a session.
///
/// Used by one-shot commands that only want to look at a session.
pub async fn fetch_snapshot(
    backend: &dyn Backend,
    token: &SessionToken,
) -> Result<Snapshot, SessionError> {
    let operation = Operation::GetStateAndConversation;
    let reply = backend
        .get_state_and_conversation(token)
        .await
        .map_err(|e| SessionError::transport(operation, e))?;
    if !reply.is_ok() {
        return Err(SessionError::rejected(operation, reply.msg));
    }
    Ok(Snapshot {
        state: reply.state.as_deref().and_then(BackendState::parse),
        raw_state: reply.state,
        conversation: Conversation::from_parts(reply.conversation, reply.source),
    })
}
