//! Subscriber connection driver
//!
//! Each attempt dials the server, sends one subscription request and then
//! runs two tasks until something fails:
//!
//! - a heartbeat sender that writes a `Heartbeat` every interval, sequence
//!   numbers starting at 0
//! - a receive loop that reads with the liveness timeout and reports change
//!   notifications and heartbeat round trips
//!
//! The two share a per-attempt cancellation token, so a failure in either
//! stops both. `Connector::run` retries after a fixed delay until the
//! caller's token is cancelled.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use tw_core::config::ClientConfig;
use tw_core::transport::{read_message, write_message};
use tw_core::{ConnectionStatus, FrameSink, FrameSource, SessionError};
use tw_protocol::{Heartbeat, LivenessContract, Message, SubscriptionRequest};

use super::dialer::{Dialer, WebSocketDialer};
use super::retry::RetryDelay;
use crate::event::ClientEvent;

/// Keeps a subscription to the server alive
pub struct Connector {
    config: ClientConfig,
    identity: String,
    dialer: Box<dyn Dialer>,
    events: mpsc::Sender<ClientEvent>,
    status: watch::Sender<ConnectionStatus>,
}

impl Connector {
    /// Create a connector that dials `config.server_url` over WebSocket
    pub fn new(config: ClientConfig, events: mpsc::Sender<ClientEvent>) -> Self {
        let dialer = WebSocketDialer::from_config(&config);
        Self::with_dialer(config, Box::new(dialer), events)
    }

    /// Create a connector using a custom dialer
    pub fn with_dialer(
        config: ClientConfig,
        dialer: Box<dyn Dialer>,
        events: mpsc::Sender<ClientEvent>,
    ) -> Self {
        let identity = config.identity();
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            config,
            identity,
            dialer,
            events,
            status,
        }
    }

    /// Identity reported to the server
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Watch the connection status
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Connect, and reconnect after every failure, until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) {
        let mut retry = RetryDelay::new(self.config.retry_delay);

        loop {
            tracing::info!(
                target_url = self.dialer.target(),
                attempt = retry.attempts() + 1,
                "Connecting"
            );

            let result = self.run_attempt(&cancel).await;
            let previous = self.status.send_replace(ConnectionStatus::Disconnected);
            if previous == ConnectionStatus::Active {
                retry.reset();
            }

            if cancel.is_cancelled() {
                break;
            }

            let error = match result {
                Ok(()) => "connection closed".to_string(),
                Err(e) => e.to_string(),
            };
            let delay = retry.next_delay();
            tracing::warn!("Connection lost: {}. Retrying in {:?}", error, delay);
            self.emit(ClientEvent::Disconnected { error });

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!("Connector stopped");
    }

    /// One connection attempt. Returns `Ok` only when cancelled.
    async fn run_attempt(&self, cancel: &CancellationToken) -> Result<(), SessionError> {
        self.status.send_replace(ConnectionStatus::Connecting);

        let connection = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            result = self.dialer.dial() => result?,
        };
        let sink = connection.sink;
        let mut source = connection.source;

        let request = SubscriptionRequest {
            identity: self.identity.clone(),
            items: self.config.items.clone(),
        };
        if let Err(e) = write_message(sink.as_ref(), &request.into()).await {
            sink.close(&e.to_string()).await;
            return Err(e);
        }

        self.status.send_replace(ConnectionStatus::Active);
        tracing::info!(
            identity = self.identity.as_str(),
            items = ?self.config.items,
            "Subscribed"
        );

        let liveness = self.config.liveness.contract();
        let attempt = cancel.child_token();
        let heartbeats = tokio::spawn(send_heartbeats(
            Arc::clone(&sink),
            liveness.interval(),
            attempt.clone(),
        ));

        let received = self.receive_loop(source.as_mut(), liveness, &attempt).await;
        attempt.cancel();

        let sent = match heartbeats.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Heartbeat task failed: {}", e);
                Ok(())
            }
        };

        let result = received.and(sent);
        let reason = match &result {
            Ok(()) => "closing".to_string(),
            Err(e) => e.to_string(),
        };
        sink.close(&reason).await;
        result
    }

    async fn receive_loop(
        &self,
        source: &mut dyn FrameSource,
        liveness: LivenessContract,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        let read_timeout = liveness.read_timeout();

        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                result = read_message(&mut *source, read_timeout) => result?,
            };

            match message {
                Message::ChangeNotification(notification) => {
                    tracing::debug!(count = notification.changes.len(), "Change notification");
                    self.emit(ClientEvent::Changes(notification.changes));
                }
                Message::HeartbeatAck(ack) => {
                    let rtt = ack.latency();
                    tracing::debug!(sequence = ack.sequence, ?rtt, "Heartbeat acknowledged");
                    self.emit(ClientEvent::Latency {
                        sequence: ack.sequence,
                        rtt,
                    });
                }
                other @ (Message::SubscriptionRequest(_) | Message::Heartbeat(_)) => {
                    let message_type = other.message_type();
                    tracing::warn!("Unexpected {} message from server", message_type);
                    return Err(SessionError::ProtocolViolation {
                        context: "from server",
                        message_type,
                    });
                }
            }
        }
    }

    /// Hand an event to the observer without waiting on it.
    ///
    /// A full channel drops the event; reads and cancellation never stall
    /// behind a slow observer.
    fn emit(&self, event: ClientEvent) {
        match self.events.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "Event observer is behind, event dropped");
            }
        }
    }
}

/// Write a heartbeat every `interval` until `cancel` fires or a write fails
async fn send_heartbeats(
    sink: Arc<dyn FrameSink>,
    interval: std::time::Duration,
    cancel: CancellationToken,
) -> Result<(), SessionError> {
    let mut sequence = 0u64;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(interval) => {}
        }

        let heartbeat = Heartbeat::new(sequence, SystemTime::now());
        if let Err(e) = write_message(sink.as_ref(), &heartbeat.into()).await {
            tracing::debug!(sequence, "Heartbeat write failed: {}", e);
            cancel.cancel();
            return Err(e);
        }
        tracing::trace!(sequence, "Heartbeat sent");
        sequence += 1;
    }
}
