//! Heartbeat configuration shared by client and server

use serde::{Deserialize, Serialize};
use std::time::Duration;

use tw_protocol::{LivenessContract, DEFAULT_HEARTBEAT_INTERVAL};

use super::serde_utils::duration_secs;
use super::Validate;
use crate::error::ConfigError;

/// Heartbeat timing. Both ends of a connection must agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Interval between heartbeats; receives time out after twice this
    #[serde(with = "duration_secs")]
    pub heartbeat_interval: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

impl LivenessConfig {
    /// The timing contract described by this configuration
    pub fn contract(&self) -> LivenessContract {
        LivenessContract::new(self.heartbeat_interval)
    }
}

impl Validate for LivenessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "liveness.heartbeat_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
