//! Connection to the notification server

mod connector;
mod dialer;
mod retry;

pub use connector::Connector;
pub use dialer::{Dialer, WebSocketDialer};
pub use retry::RetryDelay;
