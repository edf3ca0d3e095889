//! Wire format of the session backend and the trait the runtime talks to.
//!
//! Replies are decoded leniently: a field of an unexpected JSON type is
//! coerced or dropped rather than failing the whole body, so the status
//! marker decides whether a reply is usable.

use crate::error::TransportError;
use crate::identity::{SessionAddress, SessionToken};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Status marker of a successful reply.
pub const OK_MARKER: &str = "OK";

/// Reply of `GET /get_state_and_conversation`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StateAndConversationReply {
    #[serde(default, deserialize_with = "lenient_string")]
    pub msg: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    /// Alternating question/answer texts.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub conversation: Vec<String>,
    /// One source annotation per answer.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub source: Vec<String>,
}

impl StateAndConversationReply {
    /// Whether the reply carries the success marker.
    pub fn is_ok(&self) -> bool {
        self.msg.as_deref() == Some(OK_MARKER)
    }
}

/// Reply of `GET /get_state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StateReply {
    #[serde(default, deserialize_with = "lenient_string")]
    pub msg: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
}

impl StateReply {
    /// Whether the reply carries the success marker.
    pub fn is_ok(&self) -> bool {
        self.msg.as_deref() == Some(OK_MARKER)
    }
}

/// Reply of `POST /add_question`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AckReply {
    #[serde(default, deserialize_with = "lenient_string")]
    pub msg: Option<String>,
}

impl AckReply {
    /// Whether the reply carries the success marker.
    pub fn is_ok(&self) -> bool {
        self.msg.as_deref() == Some(OK_MARKER)
    }
}

/// Reply of `GET /get_heartbeat`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HeartbeatReply {
    /// Seconds since the inference backend last reported in.
    #[serde(default)]
    pub age: Option<Value>,
}

impl HeartbeatReply {
    /// The age as a finite number of seconds, if the payload carries one.
    ///
    /// Numeric strings are accepted; anything else is malformed.
    pub fn age_secs(&self) -> Option<f64> {
        let age = match self.age.as_ref()? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        age.is_finite().then_some(age)
    }
}

/// The backend a session runtime drives.
///
/// Implementations report only transport-level failures; checking the
/// status marker is the caller's business.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the state together with the full conversation.
    async fn get_state_and_conversation(
        &self,
        token: &SessionToken,
    ) -> Result<StateAndConversationReply, TransportError>;

    /// Fetch only the state.
    async fn get_state(&self, token: &SessionToken) -> Result<StateReply, TransportError>;

    /// Submit a question. `question` is sent as typed, untrimmed.
    async fn add_question(
        &self,
        token: &SessionToken,
        question: &str,
    ) -> Result<AckReply, TransportError>;

    /// Query the inference backend's liveness.
    async fn get_heartbeat(&self) -> Result<HeartbeatReply, TransportError>;

    /// Ask the application root for a new session.
    async fn new_session(&self) -> Result<SessionAddress, TransportError>;
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text))
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .map(|item| value_to_text(item).unwrap_or_default())
        .collect())
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
