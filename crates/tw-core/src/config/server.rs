//! Server configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::liveness::LivenessConfig;
use super::serde_utils::duration_secs;
use super::Validate;
use crate::error::ConfigError;

/// An item the source table starts with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedItem {
    /// Item name
    pub name: String,
    /// Initial value
    pub value: f64,
}

impl SeedItem {
    fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// Configuration for the notification server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to accept WebSocket connections on
    pub bind_address: String,

    /// Heartbeat timing expected from clients
    pub liveness: LivenessConfig,

    /// Upper bound on a single frame write
    #[serde(with = "duration_secs")]
    pub write_timeout: Duration,

    /// Pause between source mutation cycles
    #[serde(with = "duration_secs")]
    pub mutation_interval: Duration,

    /// Add unknown item names from subscription requests to the source table
    pub create_on_subscribe: bool,

    /// Items the source table starts with
    pub seed_items: Vec<SeedItem>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            liveness: LivenessConfig::default(),
            write_timeout: Duration::from_secs(5),
            mutation_interval: Duration::from_secs(2),
            create_on_subscribe: true,
            seed_items: vec![
                SeedItem::new("CMG", 1518.75),
                SeedItem::new("AAPL", 133.11),
                SeedItem::new("SPY", 426.61),
                SeedItem::new("MOAT", 74.29),
                SeedItem::new("GRMN", 144.37),
                SeedItem::new("CSL.AX", 288.18),
                SeedItem::new("QAN.AX", 4.55),
                SeedItem::new("WPL.AX", 22.45),
            ],
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.liveness.validate()?;
        if self.mutation_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "mutation_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
