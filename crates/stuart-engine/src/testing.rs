//! Scripted backend for tests.

use crate::error::TransportError;
use crate::identity::{SessionAddress, SessionToken};
use crate::protocol::{
    AckReply, Backend, HeartbeatReply, StateAndConversationReply, StateReply, OK_MARKER,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Kind of request a [`FakeBackend`] received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    StateAndConversation,
    State,
    AddQuestion,
    Heartbeat,
    NewSession,
}

type Reply<T> = Result<T, TransportError>;

/// Backend answering from per-endpoint queues.
///
/// An exhausted queue fails with a transport error, except heartbeat which
/// answers age 0.
#[derive(Default)]
pub struct FakeBackend {
    syncs: Mutex<VecDeque<Reply<StateAndConversationReply>>>,
    states: Mutex<VecDeque<Reply<StateReply>>>,
    acks: Mutex<VecDeque<Reply<AckReply>>>,
    heartbeats: Mutex<VecDeque<Reply<HeartbeatReply>>>,
    new_sessions: Mutex<VecDeque<Reply<SessionAddress>>>,
    requests: Mutex<Vec<Request>>,
    questions: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sync(&self, reply: Reply<StateAndConversationReply>) {
        self.syncs.lock().unwrap().push_back(reply);
    }

    pub fn push_state(&self, reply: Reply<StateReply>) {
        self.states.lock().unwrap().push_back(reply);
    }

    pub fn push_ack(&self, reply: Reply<AckReply>) {
        self.acks.lock().unwrap().push_back(reply);
    }

    pub fn push_heartbeat(&self, reply: Reply<HeartbeatReply>) {
        self.heartbeats.lock().unwrap().push_back(reply);
    }

    pub fn push_new_session(&self, reply: Reply<SessionAddress>) {
        self.new_sessions.lock().unwrap().push_back(reply);
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, kind: Request) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| **r == kind)
            .count()
    }

    /// Question texts submitted, in order.
    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    /// An `OK` full sync reply.
    pub fn synced(state: &str, conversation: &[&str], source: &[&str]) -> StateAndConversationReply {
        StateAndConversationReply {
            msg: Some(OK_MARKER.into()),
            state: Some(state.into()),
            conversation: conversation.iter().map(|s| (*s).to_string()).collect(),
            source: source.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// A full sync reply without the success marker.
    pub fn rejected_sync() -> StateAndConversationReply {
        StateAndConversationReply {
            msg: Some("ERROR".into()),
            ..Default::default()
        }
    }

    /// An `OK` poll reply.
    pub fn state(state: &str) -> StateReply {
        StateReply {
            msg: Some(OK_MARKER.into()),
            state: Some(state.into()),
        }
    }

    /// A poll reply without the success marker.
    pub fn rejected_state() -> StateReply {
        StateReply {
            msg: Some("ERROR".into()),
            state: None,
        }
    }

    pub fn ack() -> AckReply {
        AckReply {
            msg: Some(OK_MARKER.into()),
        }
    }

    pub fn heartbeat(age: Value) -> HeartbeatReply {
        HeartbeatReply { age: Some(age) }
    }

    fn record(&self, request: Request) {
        self.requests.lock().unwrap().push(request);
    }

    fn next<T>(queue: &Mutex<VecDeque<Reply<T>>>, what: &str) -> Reply<T> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Protocol(format!("no scripted {what} reply"))))
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn get_state_and_conversation(
        &self,
        _token: &SessionToken,
    ) -> Result<StateAndConversationReply, TransportError> {
        self.record(Request::StateAndConversation);
        Self::next(&self.syncs, "get_state_and_conversation")
    }

    async fn get_state(&self, _token: &SessionToken) -> Result<StateReply, TransportError> {
        self.record(Request::State);
        Self::next(&self.states, "get_state")
    }

    async fn add_question(
        &self,
        _token: &SessionToken,
        question: &str,
    ) -> Result<AckReply, TransportError> {
        self.record(Request::AddQuestion);
        self.questions.lock().unwrap().push(question.to_string());
        Self::next(&self.acks, "add_question")
    }

    async fn get_heartbeat(&self) -> Result<HeartbeatReply, TransportError> {
        self.record(Request::Heartbeat);
        self.heartbeats
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Self::heartbeat(Value::from(0))))
    }

    async fn new_session(&self) -> Result<SessionAddress, TransportError> {
        self.record(Request::NewSession);
        Self::next(&self.new_sessions, "new_session")
    }
}
