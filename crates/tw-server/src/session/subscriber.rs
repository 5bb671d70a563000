//! Server-side record of one subscribed peer

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tw_core::{ConnectionId, FrameSink};

/// Registry key of a session.
///
/// A connection gets a new generation each time it resubscribes, so the
/// pair is unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    /// Connection the session belongs to
    pub connection: ConnectionId,
    /// Subscription generation on that connection, starting at 1
    pub generation: u64,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/gen-{}", self.connection, self.generation)
    }
}

/// One subscribed peer: who it says it is, what it wants, where to send it.
///
/// Immutable once built. A resubscribe replaces the whole session.
pub struct Session {
    key: SessionKey,
    identity: String,
    interest: HashSet<String>,
    sink: Arc<dyn FrameSink>,
}

impl Session {
    /// Create a session for `items` on the given connection
    pub fn new(
        connection: ConnectionId,
        generation: u64,
        identity: impl Into<String>,
        items: impl IntoIterator<Item = String>,
        sink: Arc<dyn FrameSink>,
    ) -> Self {
        Self {
            key: SessionKey {
                connection,
                generation,
            },
            identity: identity.into(),
            interest: items.into_iter().collect(),
            sink,
        }
    }

    /// Registry key
    pub fn key(&self) -> SessionKey {
        self.key
    }

    /// Identity reported by the peer (not verified)
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Subscription generation on this connection
    pub fn generation(&self) -> u64 {
        self.key.generation
    }

    /// Items of interest
    pub fn interest(&self) -> &HashSet<String> {
        &self.interest
    }

    /// Whether the session wants changes to `name`
    pub fn is_interested(&self, name: &str) -> bool {
        self.interest.contains(name)
    }

    /// Write half of the session's connection
    pub fn sink(&self) -> Arc<dyn FrameSink> {
        Arc::clone(&self.sink)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("identity", &self.identity)
            .field("interest", &self.interest)
            .finish_non_exhaustive()
    }
}
