//! Error types for the session runtime.
//!
//! Errors come in two tiers. [`SessionError`] is always fatal: the session is
//! abandoned and the user is offered a fresh one. Heartbeat failures never
//! produce a `SessionError`; they degrade the liveness display instead.

use std::fmt;

/// Text appended to every fatal notice.
pub const FRESH_SESSION_HINT: &str = "Confirm to open a fresh session.";

/// A backend operation, named after the endpoint it calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `GET /get_state_and_conversation`
    GetStateAndConversation,
    /// `GET /get_state`
    GetState,
    /// `POST /add_question`
    AddQuestion,
    /// `GET /get_heartbeat`
    GetHeartbeat,
    /// `GET /`, which redirects to a newly created session.
    NewSession,
}

impl Operation {
    /// Path of the endpoint, relative to the application root.
    pub fn path(self) -> &'static str {
        match self {
            Self::GetStateAndConversation => "/get_state_and_conversation",
            Self::GetState => "/get_state",
            Self::AddQuestion => "/add_question",
            Self::GetHeartbeat => "/get_heartbeat",
            Self::NewSession => "/",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetStateAndConversation => write!(f, "get_state_and_conversation"),
            Self::GetState => write!(f, "get_state"),
            Self::AddQuestion => write!(f, "add_question"),
            Self::GetHeartbeat => write!(f, "get_heartbeat"),
            Self::NewSession => write!(f, "new_session"),
        }
    }
}

/// Failure below the protocol level: the request never produced a usable body.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, TLS or I/O failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The body was not the JSON document the endpoint promises.
    #[error("response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// The response was well-formed HTTP but not what the protocol expects.
    #[error("unexpected response: {0}")]
    Protocol(String),
}

/// Fatal session error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session address carries no usable `uuid` parameter.
    #[error("cannot get session UUID from address '{address}'")]
    InvalidAddress { address: String },

    /// The backend answered without the `OK` status marker.
    #[error("invalid session ({operation})")]
    Rejected {
        operation: Operation,
        msg: Option<String>,
    },

    /// The request failed at the transport level.
    #[error("communication error ({operation}): {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: TransportError,
    },
}

impl SessionError {
    /// Wrap a transport failure of `operation`.
    pub fn transport(operation: Operation, source: TransportError) -> Self {
        Self::Transport { operation, source }
    }

    /// A reply to `operation` lacked the success marker.
    pub fn rejected(operation: Operation, msg: Option<String>) -> Self {
        Self::Rejected { operation, msg }
    }

    /// The operation that failed, if the error came from the backend.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Rejected { operation, .. } | Self::Transport { operation, .. } => {
                Some(*operation)
            }
            Self::InvalidAddress { .. } => None,
        }
    }

    /// The blocking notice shown to the user.
    pub fn notice(&self) -> FatalNotice {
        let headline = match self {
            Self::InvalidAddress { .. } => "frontend error: cannot get my own UUID.".to_string(),
            Self::Rejected { operation, .. } => format!("error: invalid session ({operation})."),
            Self::Transport { operation, .. } => {
                format!("backend error: communication error ({operation}).")
            }
        };
        FatalNotice {
            operation: self.operation(),
            headline,
            detail: self.to_string(),
        }
    }
}

/// User-facing description of a fatal error.
///
/// Unlike [`SessionError`] this is `Clone`, so it can travel through event
/// channels and be kept by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalNotice {
    /// The failing operation, if any.
    pub operation: Option<Operation>,
    /// One-line description naming the operation.
    pub headline: String,
    /// Full error chain, for the log and for curious users.
    pub detail: String,
}

impl fmt::Display for FatalNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.headline, FRESH_SESSION_HINT)
    }
}
