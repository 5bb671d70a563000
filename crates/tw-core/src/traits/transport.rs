//! Frame transport traits
//!
//! A connection is split into a write half (`FrameSink`) that may be shared
//! between tasks, and a read half (`FrameSource`) owned by exactly one
//! receive loop.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;

/// Write half of a connection
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Write one frame. Implementations bound the write by their write timeout.
    async fn write_frame(&self, frame: Bytes) -> Result<(), TransportError>;

    /// Close the connection, telling the peer why. Errors are not reported.
    async fn close(&self, reason: &str);
}

/// Read half of a connection
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next frame.
    ///
    /// Returns `TransportError::Closed` once the peer has closed the connection.
    async fn read_frame(&mut self) -> Result<Bytes, TransportError>;
}
