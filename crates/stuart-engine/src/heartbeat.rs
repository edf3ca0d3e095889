//! Liveness monitor for the inference backend.
//!
//! Purely presentational: a failed check degrades the reading to
//! [`Liveness::Unknown`] and never ends the session.

use crate::protocol::Backend;
use crate::session::SessionEvent;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Classified liveness of the inference backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Liveness {
    Up,
    Down,
    /// Unreachable, or the reply carried no usable age.
    #[default]
    Unknown,
}

impl Liveness {
    /// Classify a heartbeat age in seconds.
    pub fn classify(age_secs: Option<f64>, down_after: Duration) -> Self {
        match age_secs {
            Some(age) if age < down_after.as_secs_f64() => Self::Up,
            Some(_) => Self::Down,
            None => Self::Unknown,
        }
    }

    /// Badge text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Unknown => "unknown state",
        }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one heartbeat check.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatReading {
    pub liveness: Liveness,
    pub age_secs: Option<f64>,
    pub checked_at: DateTime<Utc>,
}

/// Run one heartbeat check. Never fails.
pub async fn check(backend: &dyn Backend, down_after: Duration) -> HeartbeatReading {
    let age_secs = match backend.get_heartbeat().await {
        Ok(reply) => {
            let age = reply.age_secs();
            if age.is_none() {
                warn!(age = ?reply.age, "Heartbeat reply has no usable age");
            }
            age
        }
        Err(e) => {
            warn!(error = %e, "Heartbeat check failed");
            None
        }
    };

    let liveness = Liveness::classify(age_secs, down_after);
    debug!(?age_secs, %liveness, "Heartbeat");

    HeartbeatReading {
        liveness,
        age_secs,
        checked_at: Utc::now(),
    }
}

/// Check immediately, then again `interval` after each check resolves.
///
/// Runs until the task is aborted. A closed event channel does not stop it.
pub async fn run_monitor(
    backend: std::sync::Arc<dyn Backend>,
    interval: Duration,
    down_after: Duration,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) {
    loop {
        let reading = check(backend.as_ref(), down_after).await;
        let _ = event_tx.send(SessionEvent::Liveness(reading));
        tokio::time::sleep(interval).await;
    }
}
