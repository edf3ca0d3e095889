//! Session state machine.
//!
//! [`apply`] is a pure function: it maps the current state and a trigger to
//! the next state plus the side effects the session task has to perform.
//! It never touches the network or the UI itself.

use std::fmt;

/// Client-side view of the conversation's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Before the first full sync. Never re-entered.
    #[default]
    Unknown,
    /// The backend accepts a new question.
    WaitForQuestion,
    /// A question was accepted; the backend has not reported on it yet.
    QuestionSent,
    /// The question waits in the backend's queue.
    QuestionQueued,
    /// The backend is producing an answer.
    ProcessingQuestion,
}

impl SessionState {
    /// Whether a question is in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::QuestionSent | Self::QuestionQueued | Self::ProcessingQuestion
        )
    }

    /// Label shown by the wait animation, if the state has one.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::QuestionSent => Some("sending question"),
            Self::QuestionQueued => Some("question queued"),
            Self::ProcessingQuestion => Some("processing question"),
            Self::Unknown | Self::WaitForQuestion => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::WaitForQuestion => write!(f, "wait-for-question"),
            Self::QuestionSent => write!(f, "question-sent"),
            Self::QuestionQueued => write!(f, "question-queued"),
            Self::ProcessingQuestion => write!(f, "processing-question"),
        }
    }
}

/// A state the backend reports.
///
/// `QuestionSent` is purely local and never appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendState {
    WaitForQuestion,
    QuestionQueued,
    ProcessingQuestion,
}

impl BackendState {
    /// Map a wire state string. Anything unrecognized yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wait-for-question" => Some(Self::WaitForQuestion),
            "question-queued" => Some(Self::QuestionQueued),
            "processing-question" => Some(Self::ProcessingQuestion),
            _ => None,
        }
    }

    /// The wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaitForQuestion => "wait-for-question",
            Self::QuestionQueued => "question-queued",
            Self::ProcessingQuestion => "processing-question",
        }
    }
}

impl From<BackendState> for SessionState {
    fn from(state: BackendState) -> Self {
        match state {
            BackendState::WaitForQuestion => Self::WaitForQuestion,
            BackendState::QuestionQueued => Self::QuestionQueued,
            BackendState::ProcessingQuestion => Self::ProcessingQuestion,
        }
    }
}

/// What drives a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A full sync reported this state.
    Synced(BackendState),
    /// The backend acknowledged a submitted question.
    QuestionAccepted,
    /// A status poll reported this state.
    Polled(BackendState),
}

/// Side effect the session task performs after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ClearInput,
    EnableInput,
    DisableInput,
    ScrollToBottom,
    /// Arm the status poller with an immediate first poll.
    StartPolling,
    /// Re-arm the status poller after the poll interval.
    ContinuePolling,
    StopPolling,
    /// Run exactly one full sync.
    FullSync,
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: SessionState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// A trigger that is not valid in the current state.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot accept a question in state {0}")]
    NotWaiting(SessionState),

    #[error("poll result {reported} arrived in state {state} with no question in flight")]
    NotPolling {
        state: SessionState,
        reported: &'static str,
    },
}

/// Compute the transition for `trigger` in `state`.
pub fn apply(state: SessionState, trigger: Trigger) -> Result<Transition, TransitionError> {
    match trigger {
        Trigger::Synced(BackendState::WaitForQuestion) => Ok(Transition::to(
            SessionState::WaitForQuestion,
            vec![Effect::ClearInput, Effect::EnableInput, Effect::ScrollToBottom],
        )),
        Trigger::Synced(reported) => Ok(Transition::to(
            reported.into(),
            vec![Effect::DisableInput],
        )),

        Trigger::QuestionAccepted => {
            if state == SessionState::WaitForQuestion {
                Ok(Transition::to(
                    SessionState::QuestionSent,
                    vec![Effect::StartPolling],
                ))
            } else {
                Err(TransitionError::NotWaiting(state))
            }
        }

        Trigger::Polled(reported) if state.is_busy() => match reported {
            BackendState::WaitForQuestion => Ok(Transition::to(
                SessionState::WaitForQuestion,
                vec![Effect::StopPolling, Effect::FullSync],
            )),
            busy => Ok(Transition::to(busy.into(), vec![Effect::ContinuePolling])),
        },
        Trigger::Polled(reported) => Err(TransitionError::NotPolling {
            state,
            reported: reported.as_str(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SessionState; 5] = [
        SessionState::Unknown,
        SessionState::WaitForQuestion,
        SessionState::QuestionSent,
        SessionState::QuestionQueued,
        SessionState::ProcessingQuestion,
    ];

    #[test]
    fn test_backend_state_parse() {
        assert_eq!(
            BackendState::parse("wait-for-question"),
            Some(BackendState::WaitForQuestion)
        );
        assert_eq!(
            BackendState::parse("question-queued"),
            Some(BackendState::QuestionQueued)
        );
        assert_eq!(
            BackendState::parse("processing-question"),
            Some(BackendState::ProcessingQuestion)
        );
        assert_eq!(BackendState::parse("question-sent"), None);
        assert_eq!(BackendState::parse("Wait-For-Question"), None);
        assert_eq!(BackendState::parse(""), None);
    }

    #[test]
    fn test_sync_to_wait_enables_input_from_any_state() {
        for state in ALL {
            let t = apply(state, Trigger::Synced(BackendState::WaitForQuestion)).unwrap();
            assert_eq!(t.state, SessionState::WaitForQuestion);
            assert_eq!(
                t.effects,
                vec![Effect::ClearInput, Effect::EnableInput, Effect::ScrollToBottom]
            );
        }
    }

    #[test]
    fn test_sync_to_busy_disables_input() {
        let t = apply(
            SessionState::Unknown,
            Trigger::Synced(BackendState::ProcessingQuestion),
        )
        .unwrap();
        assert_eq!(t.state, SessionState::ProcessingQuestion);
        assert_eq!(t.effects, vec![Effect::DisableInput]);

        let t = apply(
            SessionState::WaitForQuestion,
            Trigger::Synced(BackendState::QuestionQueued),
        )
        .unwrap();
        assert_eq!(t.state, SessionState::QuestionQueued);
    }

    #[test]
    fn test_sync_never_starts_polling() {
        for state in ALL {
            for reported in [
                BackendState::WaitForQuestion,
                BackendState::QuestionQueued,
                BackendState::ProcessingQuestion,
            ] {
                let t = apply(state, Trigger::Synced(reported)).unwrap();
                assert!(!t.effects.contains(&Effect::StartPolling));
                assert!(!t.effects.contains(&Effect::ContinuePolling));
            }
        }
    }

    #[test]
    fn test_question_accepted_only_while_waiting() {
        let t = apply(SessionState::WaitForQuestion, Trigger::QuestionAccepted).unwrap();
        assert_eq!(t.state, SessionState::QuestionSent);
        assert_eq!(t.effects, vec![Effect::StartPolling]);

        for state in ALL
            .into_iter()
            .filter(|s| *s != SessionState::WaitForQuestion)
        {
            assert_eq!(
                apply(state, Trigger::QuestionAccepted),
                Err(TransitionError::NotWaiting(state))
            );
        }
    }

    #[test]
    fn test_poll_busy_keeps_polling() {
        for state in ALL.into_iter().filter(|s| s.is_busy()) {
            let t = apply(state, Trigger::Polled(BackendState::QuestionQueued)).unwrap();
            assert_eq!(t.state, SessionState::QuestionQueued);
            assert_eq!(t.effects, vec![Effect::ContinuePolling]);

            let t = apply(state, Trigger::Polled(BackendState::ProcessingQuestion)).unwrap();
            assert_eq!(t.state, SessionState::ProcessingQuestion);
            assert_eq!(t.effects, vec![Effect::ContinuePolling]);
        }
    }

    #[test]
    fn test_poll_wait_stops_and_syncs_once() {
        let t = apply(
            SessionState::ProcessingQuestion,
            Trigger::Polled(BackendState::WaitForQuestion),
        )
        .unwrap();
        assert_eq!(t.state, SessionState::WaitForQuestion);
        assert_eq!(t.effects, vec![Effect::StopPolling, Effect::FullSync]);
    }

    #[test]
    fn test_poll_outside_busy_states_is_rejected() {
        for state in [SessionState::Unknown, SessionState::WaitForQuestion] {
            assert!(apply(state, Trigger::Polled(BackendState::QuestionQueued)).is_err());
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(SessionState::QuestionSent.label(), Some("sending question"));
        assert_eq!(SessionState::WaitForQuestion.label(), None);
        assert!(!SessionState::Unknown.is_busy());
        assert_eq!(SessionState::QuestionQueued.to_string(), "question-queued");
    }
}
