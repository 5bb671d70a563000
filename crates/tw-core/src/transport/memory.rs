//! In-process transport
//!
//! `pair()` returns two connected endpoints: frames written to one side's
//! sink arrive at the other side's source. Closing a sink ends the stream
//! seen by the peer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::Connection;
use crate::error::TransportError;
use crate::traits::{FrameSink, FrameSource};

/// Frames buffered per direction
const CHANNEL_CAPACITY: usize = 64;

/// Write timeout used by `pair()`
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create two connected endpoints
pub fn pair() -> (Connection, Connection) {
    pair_with(CHANNEL_CAPACITY, DEFAULT_WRITE_TIMEOUT)
}

/// Create two connected endpoints with explicit buffering and write timeout
pub fn pair_with(capacity: usize, write_timeout: Duration) -> (Connection, Connection) {
    let (a_tx, b_rx) = mpsc::channel(capacity);
    let (b_tx, a_rx) = mpsc::channel(capacity);

    let a = Connection::new(
        Arc::new(MemorySink::new(a_tx, write_timeout)),
        Box::new(MemorySource { rx: a_rx }),
    );
    let b = Connection::new(
        Arc::new(MemorySink::new(b_tx, write_timeout)),
        Box::new(MemorySource { rx: b_rx }),
    );
    (a, b)
}

/// Write half of an in-process connection
pub struct MemorySink {
    tx: Mutex<Option<mpsc::Sender<Bytes>>>,
    close_reason: Mutex<Option<String>>,
    write_timeout: Duration,
}

impl MemorySink {
    fn new(tx: mpsc::Sender<Bytes>, write_timeout: Duration) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
            close_reason: Mutex::new(None),
            write_timeout,
        }
    }

    /// Reason given to `close`, if the sink has been closed
    pub fn close_reason(&self) -> Option<String> {
        self.close_reason
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn write_frame(&self, frame: Bytes) -> Result<(), TransportError> {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(TransportError::Closed)?;

        match tokio::time::timeout(self.write_timeout, tx.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::WriteTimeout(self.write_timeout)),
        }
    }

    async fn close(&self, reason: &str) {
        let mut tx = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        if tx.take().is_some() {
            *self.close_reason.lock().unwrap_or_else(|e| e.into_inner()) = Some(reason.to_string());
        }
    }
}

/// Read half of an in-process connection
pub struct MemorySource {
    rx: mpsc::Receiver<Bytes>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn read_frame(&mut self) -> Result<Bytes, TransportError> {
        self.rx.recv().await.ok_or(TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_cross_over() {
        let (mut a, mut b) = pair();
        a.sink.write_frame(Bytes::from_static(b"to-b")).await.unwrap();
        b.sink.write_frame(Bytes::from_static(b"to-a")).await.unwrap();

        assert_eq!(b.source.read_frame().await.unwrap(), "to-b");
        assert_eq!(a.source.read_frame().await.unwrap(), "to-a");
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let (a, _b) = pair();
        a.sink.close("bye").await;
        let result = a.sink.write_frame(Bytes::from_static(b"late")).await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_write_to_dropped_peer_fails() {
        let (a, b) = pair();
        drop(b);
        let result = a.sink.write_frame(Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_times_out_when_peer_stalls() {
        let (a, _b) = pair_with(1, Duration::from_secs(5));
        a.sink.write_frame(Bytes::from_static(b"1")).await.unwrap();
        let result = a.sink.write_frame(Bytes::from_static(b"2")).await;
        assert!(matches!(result, Err(TransportError::WriteTimeout(_))));
    }

    #[tokio::test]
    async fn test_close_records_first_reason() {
        let sink = MemorySink::new(mpsc::channel(1).0, DEFAULT_WRITE_TIMEOUT);
        sink.close("first").await;
        sink.close("second").await;
        assert_eq!(sink.close_reason().as_deref(), Some("first"));
    }
}
