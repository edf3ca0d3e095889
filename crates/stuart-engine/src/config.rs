//! Configuration types for stuart.
//!
//! The configuration is an optional JSON file; every field has a default,
//! so a partial file (or none at all) is valid.

use crate::session::Timings;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the config file and the log.
pub const CONFIG_DIR: &str = ".stuart";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Main configuration for stuart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend root used when no session address is given.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Delay between status polls while a question is in flight.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay between heartbeat checks.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Delay between wait animation frames.
    #[serde(default = "default_animation_interval_ms")]
    pub animation_interval_ms: u64,

    /// Heartbeat age at which the backend counts as down.
    #[serde(default = "default_heartbeat_down_after_secs")]
    pub heartbeat_down_after_secs: u64,

    /// TCP connect timeout for backend requests.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_heartbeat_interval_ms() -> u64 {
    5000
}

fn default_animation_interval_ms() -> u64 {
    500
}

fn default_heartbeat_down_after_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load from `path` if given, else from the default location if that
    /// file exists, else fall back to defaults.
    pub fn discover(path: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default = default_path(cwd);
        if default.exists() {
            Self::load(&default)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// The backend root as a URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }

    /// Loop intervals for a session.
    pub fn timings(&self) -> Timings {
        Timings {
            poll: Duration::from_millis(self.poll_interval_ms),
            heartbeat: Duration::from_millis(self.heartbeat_interval_ms),
            animation: Duration::from_millis(self.animation_interval_ms),
            heartbeat_down_after: Duration::from_secs(self.heartbeat_down_after_secs),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            animation_interval_ms: default_animation_interval_ms(),
            heartbeat_down_after_secs: default_heartbeat_down_after_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Default config file location under `cwd`.
pub fn default_path(cwd: &Path) -> PathBuf {
    cwd.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// `base_url` is not a URL.
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
