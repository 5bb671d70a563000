//! tw-client: subscriber for a tickwatch notification server
//!
//! The `Connector` dials the server, subscribes to a list of item names,
//! keeps the connection alive with heartbeats and reports what it receives
//! as `ClientEvent`s. Lost connections are retried after a fixed delay.

pub mod connection;
pub mod event;

pub use connection::{Connector, Dialer, WebSocketDialer};
pub use event::ClientEvent;
