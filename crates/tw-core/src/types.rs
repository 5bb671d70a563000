//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use tw_protocol::ItemChange;

use crate::time::epoch_seconds;

/// A named quantity tracked by the source table
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Unique name
    pub name: String,
    /// Current value
    pub value: f64,
    /// When the value last changed
    pub updated_at: SystemTime,
}

impl Item {
    /// Create an item stamped with the current time
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            updated_at: SystemTime::now(),
        }
    }

    /// Wire representation of this item's current state
    pub fn to_change(&self) -> ItemChange {
        ItemChange {
            name: self.name.clone(),
            updated_at: epoch_seconds(self.updated_at),
            value: self.value,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ${:.2}", self.name, self.value)
    }
}

/// Identifier for one accepted connection, unique within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    /// Create a new connection ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection state of a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// No connection; waiting before the next attempt
    Disconnected,
    /// Dialing the server
    Connecting,
    /// Subscribed and exchanging heartbeats
    Active,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Active => write!(f, "active"),
        }
    }
}
