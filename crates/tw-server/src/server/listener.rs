//! WebSocket listener
//!
//! Accepts TCP connections, completes the WebSocket handshake and spawns a
//! `ConnectionHandler` for each peer. A failed accept or handshake only
//! affects that peer.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use tw_core::transport;

use crate::connection::ConnectionHandler;
use crate::state::ServerState;

/// Server accepting subscriber connections
pub struct NotificationServer {
    listener: TcpListener,
    state: Arc<ServerState>,
    cancel: CancellationToken,
}

impl NotificationServer {
    /// Bind the listening socket
    pub async fn bind(
        bind_addr: &str,
        state: Arc<ServerState>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", bind_addr))?;

        Ok(Self {
            listener,
            state,
            cancel,
        })
    }

    /// Address actually bound, useful when binding port 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until cancelled
    pub async fn run(self) -> Result<()> {
        tracing::info!("Notification server listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Notification server shutting down");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((socket, peer_addr)) => self.handle_connection(socket, peer_addr),
                        Err(e) => tracing::error!("Failed to accept connection: {}", e),
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        let state = Arc::clone(&self.state);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let handshake_timeout = state.liveness().read_timeout();
            let write_timeout = state.config.write_timeout;

            let connection = tokio::select! {
                _ = cancel.cancelled() => return,
                result = tokio::time::timeout(
                    handshake_timeout,
                    transport::accept(socket, write_timeout),
                ) => match result {
                    Ok(Ok(connection)) => connection,
                    Ok(Err(e)) => {
                        tracing::warn!(peer = %peer_addr, "Handshake failed: {}", e);
                        return;
                    }
                    Err(_) => {
                        tracing::warn!(peer = %peer_addr, "Handshake timed out");
                        return;
                    }
                },
            };

            let id = state.next_connection_id();
            tracing::info!(%id, peer = %peer_addr, "Subscriber connected");

            let handler = ConnectionHandler::new(
                id,
                peer_addr.to_string(),
                Arc::clone(&state),
                connection.sink,
            );
            match handler.run(connection.source, cancel).await {
                Ok(()) => tracing::info!(%id, peer = %peer_addr, "Subscriber disconnected"),
                Err(e) => {
                    tracing::warn!(%id, peer = %peer_addr, "Subscriber disconnected: {}", e)
                }
            }
        });
    }
}
