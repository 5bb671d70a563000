//! Protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding frames
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame has no separator between the type tag and the payload
    #[error("Malformed frame: no ':' separator after the message type")]
    MalformedFrame,

    /// Type tag is not one of the registered message types
    #[error("Unknown message type: {0:?}")]
    UnknownMessageType(String),

    /// Type tag is known but the payload does not match its structure
    #[error("Payload decode error: {0}")]
    PayloadDecode(#[source] serde_json::Error),

    /// Payload could not be serialized
    #[error("Payload encode error: {0}")]
    Encode(#[source] serde_json::Error),
}
