//! Subscription registry and change fan-out
//!
//! The registry holds every live session. `notify` matches a batch of
//! changed items against each session's interest set while holding the
//! membership lock, so it always sees a consistent set of sessions. The
//! resulting notifications are written by one spawned task per recipient,
//! outside the lock: a slow or dead peer never stalls delivery to others.
//!
//! # Delivery Failures
//!
//! A failed write is logged and dropped. The registry never removes a session
//! on its own; the session's receive loop notices the dead connection (read
//! error or liveness timeout) and deregisters it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use tw_core::transport::write_message;
use tw_core::{FrameSink, Item};
use tw_protocol::{ChangeNotification, ItemChange};

use super::subscriber::{Session, SessionKey};

/// Membership table of live sessions plus the fan-out dispatcher
pub struct Registry {
    /// Sessions indexed by key
    sessions: Mutex<HashMap<SessionKey, Arc<Session>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Add a session.
    ///
    /// Registering the same key twice keeps a single entry.
    pub async fn register(&self, session: Arc<Session>) {
        let mut sessions = self.sessions.lock().await;
        let key = session.key();
        let identity = session.identity().to_string();
        if sessions.insert(key, session).is_some() {
            tracing::warn!(%key, "Session registered twice, replaced");
        }
        tracing::info!(
            %key,
            identity = identity.as_str(),
            total = sessions.len(),
            "Session added"
        );
    }

    /// Remove a session. Returns `false` if it was not registered.
    pub async fn deregister(&self, session: &Session) -> bool {
        let mut sessions = self.sessions.lock().await;
        let key = session.key();
        let removed = sessions.remove(&key).is_some();
        if removed {
            tracing::info!(
                %key,
                identity = session.identity(),
                total = sessions.len(),
                "Session removed"
            );
        }
        removed
    }

    /// Send each interested session the subset of `changed` it subscribed to.
    ///
    /// Returns the number of deliveries dispatched. Does not wait for them.
    pub async fn notify(&self, changed: &[Item]) -> usize {
        if changed.is_empty() {
            return 0;
        }

        let sessions = self.sessions.lock().await;
        let mut dispatched = 0;

        for session in sessions.values() {
            let changes: Vec<ItemChange> = changed
                .iter()
                .filter(|item| session.is_interested(&item.name))
                .map(Item::to_change)
                .collect();

            if changes.is_empty() {
                continue;
            }

            tokio::spawn(deliver(
                session.key(),
                session.sink(),
                ChangeNotification { changes },
            ));
            dispatched += 1;
        }

        tracing::trace!(
            changed = changed.len(),
            sessions = sessions.len(),
            dispatched,
            "Fan-out computed"
        );
        dispatched
    }

    /// Whether a session with this key is registered
    pub async fn contains(&self, key: SessionKey) -> bool {
        self.sessions.lock().await.contains_key(&key)
    }

    /// List all sessions
    pub async fn list(&self) -> Vec<Arc<Session>> {
        self.sessions.lock().await.values().cloned().collect()
    }

    /// Number of registered sessions
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Check if empty
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Write one notification. Failures are logged only.
async fn deliver(key: SessionKey, sink: Arc<dyn FrameSink>, notification: ChangeNotification) {
    let count = notification.changes.len();
    match write_message(sink.as_ref(), &notification.into()).await {
        Ok(()) => tracing::debug!(%key, count, "Change notification sent"),
        Err(e) => tracing::warn!(%key, "Change notification failed: {}", e),
    }
}
