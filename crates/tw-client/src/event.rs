//! Events reported to the connector's observer

use std::time::{Duration, SystemTime};

use tw_core::time::epoch_seconds;
use tw_protocol::ItemChange;

/// Something the observer of a `Connector` may want to know about
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The server pushed changes to subscribed items
    Changes(Vec<ItemChange>),
    /// A heartbeat came back
    Latency {
        /// Sequence number of the acknowledged heartbeat
        sequence: u64,
        /// Round-trip time
        rtt: Duration,
    },
    /// A connection attempt ended; the connector will retry
    Disconnected {
        /// Why the attempt ended
        error: String,
    },
}

/// Seconds between a change's `updated_at` and `now`.
///
/// Saturates instead of overflowing on extreme server-supplied values.
pub fn change_age_secs(change: &ItemChange, now: SystemTime) -> i64 {
    epoch_seconds(now).saturating_sub(change.updated_at)
}
