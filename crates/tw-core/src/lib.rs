//! tw-core: Core abstractions and configuration for tickwatch
//!
//! This crate provides the shared types, error taxonomy, configuration
//! structures and frame transports used by the server and client.

pub mod config;
pub mod error;
pub mod time;
pub mod traits;
pub mod transport;
pub mod types;

pub use error::{ConfigError, SessionError, TransportError};
pub use traits::{FrameSink, FrameSource};
pub use types::{ConnectionId, ConnectionStatus, Item};
