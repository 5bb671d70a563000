//! Core error types for tickwatch

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tw_protocol::{MessageType, ProtocolError};

/// Transport-level failures: dial, accept, read, write, close
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not open a connection
    #[error("Failed to connect to {url}: {message}")]
    Dial { url: String, message: String },

    /// Dial did not complete in time
    #[error("Connection to {url} timed out after {timeout:?}")]
    DialTimeout { url: String, timeout: Duration },

    /// Inbound handshake failed
    #[error("Handshake failed: {0}")]
    Accept(String),

    /// Read failed
    #[error("Read failed: {0}")]
    Read(String),

    /// Write failed
    #[error("Write failed: {0}")]
    Write(String),

    /// Write did not complete in time
    #[error("Write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// Peer closed the connection
    #[error("Connection closed")]
    Closed,

    /// Peer sent a frame kind the protocol does not use
    #[error("Unexpected {0} frame")]
    UnexpectedFrame(&'static str),
}

/// Errors that end a connection attempt or session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A well-formed message that is not valid in this context
    #[error("Protocol violation: unexpected {message_type} message {context}")]
    ProtocolViolation {
        context: &'static str,
        message_type: MessageType,
    },

    /// Nothing arrived within the liveness window
    #[error("Peer unresponsive: no message within {0:?}")]
    ReadTimeout(Duration),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
