//! Per-connection receive loop
//!
//! Each accepted connection is driven by one `ConnectionHandler`. Messages
//! are processed strictly in arrival order. Every read is bounded by the
//! liveness timeout, so a silent peer is dropped after two missed heartbeats.
//!
//! However the loop ends, the connection's session is deregistered and the
//! transport is closed before `run` returns.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tw_core::transport::{read_message, write_message};
use tw_core::{ConnectionId, FrameSink, FrameSource, SessionError, TransportError};
use tw_protocol::{Heartbeat, Message, SubscriptionRequest};

use crate::session::Session;
use crate::state::ServerState;

/// Server side of one subscriber connection
pub struct ConnectionHandler {
    id: ConnectionId,
    peer: String,
    state: Arc<ServerState>,
    sink: Arc<dyn FrameSink>,
    /// Currently registered session, if the peer has subscribed
    session: Option<Arc<Session>>,
    /// Last subscription generation handed out on this connection
    generation: u64,
}

impl ConnectionHandler {
    /// Create a handler for a freshly accepted connection
    pub fn new(
        id: ConnectionId,
        peer: impl Into<String>,
        state: Arc<ServerState>,
        sink: Arc<dyn FrameSink>,
    ) -> Self {
        Self {
            id,
            peer: peer.into(),
            state,
            sink,
            session: None,
            generation: 0,
        }
    }

    /// Drive the connection until the peer leaves, misbehaves or `cancel` fires.
    ///
    /// A graceful close by the peer and shutdown both return `Ok`.
    pub async fn run(
        mut self,
        mut source: Box<dyn FrameSource>,
        cancel: CancellationToken,
    ) -> Result<(), SessionError> {
        let result = self.receive_loop(source.as_mut(), &cancel).await;

        if let Some(session) = self.session.take() {
            self.state.registry.deregister(&session).await;
        }

        let reason = match &result {
            Ok(()) => "closing".to_string(),
            Err(e) => e.to_string(),
        };
        self.sink.close(&reason).await;

        result
    }

    async fn receive_loop(
        &mut self,
        source: &mut dyn FrameSource,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        let read_timeout = self.state.liveness().read_timeout();

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(id = %self.id, "Connection cancelled");
                    return Ok(());
                }
                result = read_message(&mut *source, read_timeout) => result,
            };

            let message = match result {
                Ok(message) => message,
                Err(SessionError::Transport(TransportError::Closed)) => {
                    tracing::debug!(id = %self.id, peer = %self.peer, "Peer closed connection");
                    return Ok(());
                }
                Err(e @ SessionError::Protocol(_)) => {
                    tracing::warn!(id = %self.id, peer = %self.peer, "Malformed message: {}", e);
                    return Err(e);
                }
                Err(e) => return Err(e),
            };

            match message {
                Message::SubscriptionRequest(request) => self.subscribe(request).await,
                Message::Heartbeat(heartbeat) => self.acknowledge(heartbeat).await?,
                other @ (Message::ChangeNotification(_) | Message::HeartbeatAck(_)) => {
                    let message_type = other.message_type();
                    tracing::warn!(
                        id = %self.id,
                        peer = %self.peer,
                        "Unexpected {} message from subscriber",
                        message_type
                    );
                    return Err(SessionError::ProtocolViolation {
                        context: "from subscriber",
                        message_type,
                    });
                }
            }
        }
    }

    /// Replace this connection's session with one for the requested items
    async fn subscribe(&mut self, request: SubscriptionRequest) {
        if let Some(previous) = self.session.take() {
            self.state.registry.deregister(&previous).await;
        }

        self.generation += 1;
        tracing::info!(
            id = %self.id,
            peer = %self.peer,
            identity = request.identity.as_str(),
            generation = self.generation,
            items = ?request.items,
            "Subscription updated"
        );

        let session = Arc::new(Session::new(
            self.id,
            self.generation,
            request.identity,
            request.items.iter().cloned(),
            Arc::clone(&self.sink),
        ));
        self.state.registry.register(Arc::clone(&session)).await;
        self.session = Some(session);

        if self.state.config.create_on_subscribe {
            for (ix, name) in request.items.iter().enumerate() {
                self.state.table.upsert(name, (ix * ix) as f64).await;
            }
        }
    }

    async fn acknowledge(&self, heartbeat: Heartbeat) -> Result<(), SessionError> {
        tracing::trace!(id = %self.id, sequence = heartbeat.sequence, "Heartbeat");
        write_message(self.sink.as_ref(), &heartbeat.ack().into()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    use tokio::task::JoinHandle;
    use tw_core::config::{LivenessConfig, ServerConfig};
    use tw_core::transport::{memory, Connection};
    use tw_core::Item;
    use tw_protocol::{HeartbeatAck, MessageType, Timestamp};

    use crate::source::SourceTable;

    fn test_state(create_on_subscribe: bool) -> Arc<ServerState> {
        let config = ServerConfig {
            liveness: LivenessConfig {
                heartbeat_interval: Duration::from_secs(1),
            },
            create_on_subscribe,
            ..Default::default()
        };
        Arc::new(ServerState::with_table(config, SourceTable::new()))
    }

    fn spawn_handler(
        state: &Arc<ServerState>,
        cancel: &CancellationToken,
    ) -> (Connection, JoinHandle<Result<(), SessionError>>) {
        let (server_side, peer) = memory::pair();
        let handler = ConnectionHandler::new(
            state.next_connection_id(),
            "test-peer",
            Arc::clone(state),
            server_side.sink,
        );
        let task = tokio::spawn(handler.run(server_side.source, cancel.clone()));
        (peer, task)
    }

    async fn send(peer: &Connection, message: impl Into<Message>) {
        write_message(peer.sink.as_ref(), &message.into())
            .await
            .unwrap();
    }

    fn subscribe(items: &[&str]) -> SubscriptionRequest {
        SubscriptionRequest {
            identity: "client:42".to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Round-trip a heartbeat so every earlier message has been handled
    async fn sync(peer: &mut Connection, sequence: u64) -> HeartbeatAck {
        let heartbeat = Heartbeat {
            sequence,
            sent_at: Timestamp::new(1_700_000_000, 5),
        };
        send(peer, heartbeat.clone()).await;
        match read_message(peer.source.as_mut(), Duration::from_secs(1)).await {
            Ok(Message::HeartbeatAck(ack)) => ack,
            other => panic!("Expected heartbeat ack, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_heartbeat_is_echoed() {
        let state = test_state(true);
        let cancel = CancellationToken::new();
        let (mut peer, _task) = spawn_handler(&state, &cancel);

        let ack = sync(&mut peer, 7).await;
        assert_eq!(ack.sequence, 7);
        assert_eq!(ack.sent_at, Timestamp::new(1_700_000_000, 5));
    }

    #[tokio::test]
    async fn test_resubscribe_replaces_session() {
        let state = test_state(true);
        let cancel = CancellationToken::new();
        let (mut peer, _task) = spawn_handler(&state, &cancel);

        send(&peer, subscribe(&["X"])).await;
        send(&peer, subscribe(&["Y"])).await;
        sync(&mut peer, 0).await;

        let sessions = state.registry.list().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].generation(), 2);
        assert_eq!(sessions[0].identity(), "client:42");
        let expected: HashSet<String> = ["Y".to_string()].into();
        assert_eq!(sessions[0].interest(), &expected);

        assert_eq!(state.registry.notify(&[Item::new("X", 1.0)]).await, 0);
        assert_eq!(state.registry.notify(&[Item::new("Y", 1.0)]).await, 1);
    }

    #[tokio::test]
    async fn test_subscribe_upserts_unknown_items() {
        let state = test_state(true);
        state.table.upsert("B", 50.0).await;
        let cancel = CancellationToken::new();
        let (mut peer, _task) = spawn_handler(&state, &cancel);

        send(&peer, subscribe(&["A", "B", "C"])).await;
        sync(&mut peer, 0).await;

        assert_eq!(state.table.get("A").await.unwrap().value, 0.0);
        assert_eq!(state.table.get("B").await.unwrap().value, 50.0);
        assert_eq!(state.table.get("C").await.unwrap().value, 4.0);
    }

    #[tokio::test]
    async fn test_subscribe_without_upsert() {
        let state = test_state(false);
        let cancel = CancellationToken::new();
        let (mut peer, _task) = spawn_handler(&state, &cancel);

        send(&peer, subscribe(&["A"])).await;
        sync(&mut peer, 0).await;

        assert!(state.table.is_empty().await);
        assert_eq!(state.registry.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_times_out() {
        let state = test_state(true);
        let cancel = CancellationToken::new();
        let (mut peer, task) = spawn_handler(&state, &cancel);

        send(&peer, subscribe(&["X"])).await;
        sync(&mut peer, 0).await;
        assert_eq!(state.registry.len().await, 1);

        let result = task.await.unwrap();
        assert!(matches!(
            result,
            Err(SessionError::ReadTimeout(t)) if t == Duration::from_secs(2)
        ));
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_unexpected_message_is_violation() {
        let state = test_state(true);
        let cancel = CancellationToken::new();
        let (mut peer, task) = spawn_handler(&state, &cancel);

        send(&peer, subscribe(&["X"])).await;
        send(&peer, Heartbeat::new(1, std::time::SystemTime::now()).ack()).await;

        let result = task.await.unwrap();
        assert!(matches!(
            result,
            Err(SessionError::ProtocolViolation {
                message_type: MessageType::HeartbeatAck,
                ..
            })
        ));
        assert!(state.registry.is_empty().await);

        let closed = read_message(peer.source.as_mut(), Duration::from_secs(1)).await;
        assert!(matches!(
            closed,
            Err(SessionError::Transport(TransportError::Closed))
        ));
    }

    #[tokio::test]
    async fn test_malformed_frame_ends_connection() {
        let state = test_state(true);
        let cancel = CancellationToken::new();
        let (peer, task) = spawn_handler(&state, &cancel);

        peer.sink
            .write_frame(bytes::Bytes::from_static(b"no separator"))
            .await
            .unwrap();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(SessionError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_peer_close_deregisters() {
        let state = test_state(true);
        let cancel = CancellationToken::new();
        let (mut peer, task) = spawn_handler(&state, &cancel);

        send(&peer, subscribe(&["X"])).await;
        sync(&mut peer, 0).await;
        peer.sink.close("bye").await;

        assert!(task.await.unwrap().is_ok());
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_cancel_deregisters() {
        let state = test_state(true);
        let cancel = CancellationToken::new();
        let (mut peer, task) = spawn_handler(&state, &cancel);

        send(&peer, subscribe(&["X"])).await;
        sync(&mut peer, 0).await;
        cancel.cancel();

        assert!(task.await.unwrap().is_ok());
        assert!(state.registry.is_empty().await);
    }
}
