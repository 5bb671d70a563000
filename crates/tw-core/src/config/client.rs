//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::liveness::LivenessConfig;
use super::serde_utils::duration_secs;
use super::Validate;
use crate::error::ConfigError;

/// Configuration for the subscriber client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket URL of the server, e.g. `ws://localhost:8080`
    pub server_url: String,

    /// Item names to subscribe to
    pub items: Vec<String>,

    /// Identity reported to the server (defaults to `client:<pid>`)
    pub identity: Option<String>,

    /// Heartbeat timing
    pub liveness: LivenessConfig,

    /// How long to wait for the server to accept a connection
    #[serde(with = "duration_secs")]
    pub dial_timeout: Duration,

    /// Fixed pause between connection attempts
    #[serde(with = "duration_secs")]
    pub retry_delay: Duration,

    /// Upper bound on a single frame write
    #[serde(with = "duration_secs")]
    pub write_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8080".to_string(),
            items: vec![],
            identity: None,
            liveness: LivenessConfig::default(),
            dial_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Get the identity, falling back to `client:<pid>`
    pub fn identity(&self) -> String {
        self.identity
            .clone()
            .unwrap_or_else(|| format!("client:{}", std::process::id()))
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.liveness.validate()
    }
}
