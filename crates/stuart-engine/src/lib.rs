//! stuart-engine: Headless runtime for a polling conversational session
//!
//! This crate provides the session logic behind the stuart client, including:
//! - Session identity resolution
//! - The HTTP transport and wire format of the session backend
//! - The session state machine and status poller
//! - Heartbeat monitoring and the wait animation
//! - Configuration

pub mod animation;
pub mod config;
pub mod conversation;
pub mod error;
pub mod heartbeat;
pub mod identity;
pub mod protocol;
pub mod session;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use conversation::{Block, BlockKind, Conversation, Entry};
pub use error::{FatalNotice, Operation, SessionError, TransportError, FRESH_SESSION_HINT};
pub use heartbeat::{HeartbeatReading, Liveness};
pub use identity::{application_root, SessionAddress, SessionToken};
pub use protocol::Backend;
pub use session::{
    create_session, fetch_snapshot, open_session, start_session, SessionCommand, SessionEvent,
    SessionHandle, SessionView, Snapshot, Timings,
};
pub use state::{BackendState, SessionState};
pub use transport::HttpBackend;

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
