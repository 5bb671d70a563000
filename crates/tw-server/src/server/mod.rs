//! WebSocket listener

mod listener;

pub use listener::NotificationServer;
