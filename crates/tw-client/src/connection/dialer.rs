//! Outbound connection establishment

use std::time::Duration;

use async_trait::async_trait;

use tw_core::config::ClientConfig;
use tw_core::transport::{self, Connection};
use tw_core::TransportError;

/// Opens a new connection to the server for each attempt
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Open a connection
    async fn dial(&self) -> Result<Connection, TransportError>;

    /// Where this dialer connects to, for logs
    fn target(&self) -> &str;
}

/// Dials a WebSocket URL
#[derive(Debug, Clone)]
pub struct WebSocketDialer {
    url: String,
    dial_timeout: Duration,
    write_timeout: Duration,
}

impl WebSocketDialer {
    /// Create a dialer for `url`
    pub fn new(url: impl Into<String>, dial_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            dial_timeout,
            write_timeout,
        }
    }

    /// Create a dialer from the client configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.server_url.clone(),
            config.dial_timeout,
            config.write_timeout,
        )
    }
}

#[async_trait]
impl Dialer for WebSocketDialer {
    async fn dial(&self) -> Result<Connection, TransportError> {
        transport::dial(&self.url, self.dial_timeout, self.write_timeout).await
    }

    fn target(&self) -> &str {
        &self.url
    }
}
