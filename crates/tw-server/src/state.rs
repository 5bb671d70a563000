//! Shared server state

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tw_core::config::ServerConfig;
use tw_core::ConnectionId;
use tw_protocol::LivenessContract;

use crate::session::Registry;
use crate::source::SourceTable;

/// State shared by the listener, every connection handler and the mutator
pub struct ServerState {
    /// Configuration
    pub config: ServerConfig,
    /// Live subscriptions
    pub registry: Arc<Registry>,
    /// Tracked items
    pub table: Arc<SourceTable>,
    next_connection_id: AtomicU64,
}

impl ServerState {
    /// Create state with a source table built from the configured seeds
    pub fn new(config: ServerConfig) -> Self {
        let table = SourceTable::from_seeds(&config.seed_items);
        Self::with_table(config, table)
    }

    /// Create state around an existing source table
    pub fn with_table(config: ServerConfig, table: SourceTable) -> Self {
        Self {
            config,
            registry: Arc::new(Registry::new()),
            table: Arc::new(table),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Heartbeat timing shared with subscribers
    pub fn liveness(&self) -> LivenessContract {
        self.config.liveness.contract()
    }

    /// Allocate an ID for a newly accepted connection
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }
}
