//! WebSocket transport
//!
//! Frames travel as WebSocket text messages. Ping/pong control frames are
//! handled by the WebSocket layer and never surface as frames.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;

use super::Connection;
use crate::error::TransportError;
use crate::traits::{FrameSink, FrameSource};

/// Dial a WebSocket server, giving up after `timeout`
pub async fn dial(
    url: &str,
    timeout: Duration,
    write_timeout: Duration,
) -> Result<Connection, TransportError> {
    tracing::debug!(url, "Dialing");

    let (stream, _response) = tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url))
        .await
        .map_err(|_| TransportError::DialTimeout {
            url: url.to_string(),
            timeout,
        })?
        .map_err(|e| TransportError::Dial {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    Ok(split(stream, write_timeout))
}

/// Complete the WebSocket handshake on an accepted stream
pub async fn accept<S>(stream: S, write_timeout: Duration) -> Result<Connection, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let stream = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| TransportError::Accept(e.to_string()))?;

    Ok(split(stream, write_timeout))
}

fn split<S>(stream: WebSocketStream<S>, write_timeout: Duration) -> Connection
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, source) = stream.split();
    Connection::new(
        Arc::new(WebSocketSink {
            inner: Mutex::new(sink),
            write_timeout,
        }),
        Box::new(WebSocketSource { inner: source }),
    )
}

/// Write half of a WebSocket connection
pub struct WebSocketSink<S> {
    inner: Mutex<SplitSink<WebSocketStream<S>, WsMessage>>,
    write_timeout: Duration,
}

#[async_trait]
impl<S> FrameSink for WebSocketSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn write_frame(&self, frame: Bytes) -> Result<(), TransportError> {
        let text = std::str::from_utf8(&frame)
            .map_err(|_| TransportError::Write("frame is not valid UTF-8".to_string()))?
            .to_owned();

        let write = async {
            let mut sink = self.inner.lock().await;
            sink.send(WsMessage::text(text)).await
        };

        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                Err(TransportError::Closed)
            }
            Ok(Err(e)) => Err(TransportError::Write(e.to_string())),
            Err(_) => Err(TransportError::WriteTimeout(self.write_timeout)),
        }
    }

    async fn close(&self, reason: &str) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: reason.to_string().into(),
        };

        let close = async {
            let mut sink = self.inner.lock().await;
            sink.send(WsMessage::Close(Some(frame))).await
        };

        match tokio::time::timeout(self.write_timeout, close).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("WebSocket close: {}", e),
            Err(_) => tracing::debug!("WebSocket close timed out"),
        }
    }
}

/// Read half of a WebSocket connection
pub struct WebSocketSource<S> {
    inner: SplitStream<WebSocketStream<S>>,
}

#[async_trait]
impl<S> FrameSource for WebSocketSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read_frame(&mut self) -> Result<Bytes, TransportError> {
        loop {
            let message = match self.inner.next().await {
                None => return Err(TransportError::Closed),
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    return Err(TransportError::Closed)
                }
                Some(Err(e)) => return Err(TransportError::Read(e.to_string())),
                Some(Ok(message)) => message,
            };

            match message {
                WsMessage::Text(text) => return Ok(Bytes::copy_from_slice(text.as_bytes())),
                WsMessage::Binary(_) => return Err(TransportError::UnexpectedFrame("binary")),
                WsMessage::Close(_) => return Err(TransportError::Closed),
                // Control frames are answered by tungstenite
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
            }
        }
    }
}
