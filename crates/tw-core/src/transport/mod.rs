//! Frame transports
//!
//! `websocket` carries frames as WebSocket text messages; `memory` connects
//! two endpoints in-process and is used by tests.

pub mod memory;
pub mod websocket;

use std::sync::Arc;
use std::time::Duration;

use tw_protocol::Message;

use crate::error::SessionError;
use crate::traits::{FrameSink, FrameSource};

pub use websocket::{accept, dial};

/// Both halves of an established connection
pub struct Connection {
    /// Shared write half
    pub sink: Arc<dyn FrameSink>,
    /// Read half, owned by the receive loop
    pub source: Box<dyn FrameSource>,
}

impl Connection {
    /// Bundle a sink and a source
    pub fn new(sink: Arc<dyn FrameSink>, source: Box<dyn FrameSource>) -> Self {
        Self { sink, source }
    }
}

/// Encode a message and write it as one frame
pub async fn write_message(sink: &dyn FrameSink, message: &Message) -> Result<(), SessionError> {
    let frame = tw_protocol::encode(message)?;
    sink.write_frame(frame).await?;
    Ok(())
}

/// Wait up to `timeout` for the next frame and decode it
pub async fn read_message<S>(source: &mut S, timeout: Duration) -> Result<Message, SessionError>
where
    S: FrameSource + ?Sized,
{
    let frame = tokio::time::timeout(timeout, source.read_frame())
        .await
        .map_err(|_| SessionError::ReadTimeout(timeout))??;

    Ok(tw_protocol::decode(&frame)?)
}
