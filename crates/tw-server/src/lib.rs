//! tw-server: change notification server
//!
//! Accepts WebSocket subscribers, tracks which items each one is interested
//! in, periodically mutates a table of items and pushes the changes to every
//! interested subscriber. Subscribers prove liveness with heartbeats.

pub mod connection;
pub mod server;
pub mod session;
pub mod source;
pub mod state;

pub use server::NotificationServer;
pub use state::ServerState;
