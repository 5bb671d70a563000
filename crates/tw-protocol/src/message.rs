//! Message types for the tickwatch protocol
//!
//! This module defines the four messages exchanged between a subscriber and
//! the notification server. Messages are serialized into text frames by the
//! codec in `codec.rs`.
//!
//! # Message Flow
//!
//! 1. Subscriber connects and sends `SubscriptionRequest`
//! 2. Server sends `ChangeNotification` whenever a subscribed item changes
//! 3. Subscriber sends `Heartbeat` every interval, server answers with `HeartbeatAck`
//! 4. Subscriber may send another `SubscriptionRequest` at any time to
//!    replace its interest set
//!
//! # Wire Names
//!
//! Type tags and JSON field names are fixed by the deployed protocol
//! (`TickerRequest`, `Symbol`, `Price`, ...) and must not be renamed.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Message type identifier, carried on the wire as the frame tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Subscriber declares its identity and items of interest
    SubscriptionRequest,
    /// Server reports changed items
    ChangeNotification,
    /// Liveness probe from the connection initiator
    Heartbeat,
    /// Echo of a liveness probe
    HeartbeatAck,
}

impl MessageType {
    /// Every registered message type
    pub const ALL: [MessageType; 4] = [
        MessageType::SubscriptionRequest,
        MessageType::ChangeNotification,
        MessageType::Heartbeat,
        MessageType::HeartbeatAck,
    ];

    /// Wire tag for this message type
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SubscriptionRequest => "TickerRequest",
            Self::ChangeNotification => "TickerChange",
            Self::Heartbeat => "Ping",
            Self::HeartbeatAck => "Pong",
        }
    }

    /// Look up a message type by wire tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "TickerRequest" => Some(Self::SubscriptionRequest),
            "TickerChange" => Some(Self::ChangeNotification),
            "Ping" => Some(Self::Heartbeat),
            "Pong" => Some(Self::HeartbeatAck),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Wall-clock instant split into whole seconds and a nanosecond remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since the Unix epoch
    #[serde(rename = "Seconds")]
    pub seconds: i64,
    /// Nanosecond remainder
    #[serde(rename = "Nanos")]
    pub nanos: i64,
}

impl Timestamp {
    /// Create a timestamp from its parts
    pub fn new(seconds: i64, nanos: i64) -> Self {
        Self { seconds, nanos }
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert from a `SystemTime`
    pub fn from_system_time(time: SystemTime) -> Self {
        let total = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_nanos() as i128,
            Err(before) => -(before.duration().as_nanos() as i128),
        };
        Self {
            seconds: total.div_euclid(NANOS_PER_SEC) as i64,
            nanos: total.rem_euclid(NANOS_PER_SEC) as i64,
        }
    }

    /// Convert to a `SystemTime`, normalizing out-of-range nanoseconds.
    ///
    /// `None` if the instant cannot be represented on this platform.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        let total = self.seconds as i128 * NANOS_PER_SEC + self.nanos as i128;
        let magnitude = Duration::new(
            (total.unsigned_abs() / NANOS_PER_SEC as u128) as u64,
            (total.unsigned_abs() % NANOS_PER_SEC as u128) as u32,
        );
        if total >= 0 {
            UNIX_EPOCH.checked_add(magnitude)
        } else {
            UNIX_EPOCH.checked_sub(magnitude)
        }
    }
}

/// Sent by a subscriber to declare the items it wants to hear about.
///
/// Sending it again on the same connection replaces the previous interest set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Printable identifier chosen by the subscriber
    #[serde(rename = "Id")]
    pub identity: String,
    /// Item names of interest
    #[serde(rename = "Tickers", default, deserialize_with = "null_as_empty")]
    pub items: Vec<String>,
}

/// A single changed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemChange {
    /// Item name
    #[serde(rename = "Symbol")]
    pub name: String,
    /// Last update, seconds since the Unix epoch
    #[serde(rename = "UpdateTime")]
    pub updated_at: i64,
    /// New value
    #[serde(rename = "Price")]
    pub value: f64,
}

/// Sent by the server with the subscribed items that changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    /// Changed items, in the order the source reported them
    #[serde(rename = "Changes", default, deserialize_with = "null_as_empty")]
    pub changes: Vec<ItemChange>,
}

/// Liveness probe sent by the connection initiator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Monotonic per-connection sequence number
    #[serde(rename = "Sequence")]
    pub sequence: u64,
    /// When the probe was sent
    #[serde(flatten)]
    pub sent_at: Timestamp,
}

/// Echo of a `Heartbeat`, carrying its sequence and timestamp unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatAck {
    /// Sequence number of the acknowledged probe
    #[serde(rename = "Sequence")]
    pub sequence: u64,
    /// Timestamp copied from the probe
    #[serde(flatten)]
    pub sent_at: Timestamp,
}

/// Protocol messages
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Declare or replace the interest set
    SubscriptionRequest(SubscriptionRequest),
    /// Changed items
    ChangeNotification(ChangeNotification),
    /// Liveness probe
    Heartbeat(Heartbeat),
    /// Liveness probe echo
    HeartbeatAck(HeartbeatAck),
}

impl Message {
    /// Get the message type for this message
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::SubscriptionRequest(_) => MessageType::SubscriptionRequest,
            Message::ChangeNotification(_) => MessageType::ChangeNotification,
            Message::Heartbeat(_) => MessageType::Heartbeat,
            Message::HeartbeatAck(_) => MessageType::HeartbeatAck,
        }
    }
}

impl From<SubscriptionRequest> for Message {
    fn from(msg: SubscriptionRequest) -> Self {
        Message::SubscriptionRequest(msg)
    }
}

impl From<ChangeNotification> for Message {
    fn from(msg: ChangeNotification) -> Self {
        Message::ChangeNotification(msg)
    }
}

impl From<Heartbeat> for Message {
    fn from(msg: Heartbeat) -> Self {
        Message::Heartbeat(msg)
    }
}

impl From<HeartbeatAck> for Message {
    fn from(msg: HeartbeatAck) -> Self {
        Message::HeartbeatAck(msg)
    }
}

// Older peers encode an empty list as JSON `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_tag_roundtrip() {
        for msg_type in MessageType::ALL {
            let recovered = MessageType::from_tag(msg_type.tag()).unwrap();
            assert_eq!(recovered, msg_type);
        }
    }

    #[test]
    fn test_tags_never_contain_separator() {
        for msg_type in MessageType::ALL {
            assert!(!msg_type.tag().as_bytes().contains(&crate::SEPARATOR));
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(MessageType::from_tag("Bogus"), None);
        assert_eq!(MessageType::from_tag("ping"), None);
        assert_eq!(MessageType::from_tag(""), None);
    }

    #[test]
    fn test_timestamp_system_time_roundtrip() {
        let time = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        let ts = Timestamp::from_system_time(time);
        assert_eq!(ts, Timestamp::new(1_700_000_000, 123_456_789));
        assert_eq!(ts.to_system_time(), Some(time));
    }

    #[test]
    fn test_timestamp_before_epoch() {
        let time = UNIX_EPOCH - Duration::new(1, 250_000_000);
        let ts = Timestamp::from_system_time(time);
        assert_eq!(ts, Timestamp::new(-2, 750_000_000));
        assert_eq!(ts.to_system_time(), Some(time));
    }

    #[test]
    fn test_timestamp_normalizes_overflowing_nanos() {
        let ts = Timestamp::new(10, 1_500_000_000);
        assert_eq!(
            ts.to_system_time(),
            Some(UNIX_EPOCH + Duration::new(11, 500_000_000))
        );
    }

    #[test]
    fn test_timestamp_out_of_range() {
        assert_eq!(Timestamp::new(i64::MAX, 2_000_000_000).to_system_time(), None);
        assert_eq!(Timestamp::new(i64::MIN, i64::MIN).to_system_time(), None);
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        let req: SubscriptionRequest =
            serde_json::from_str(r#"{"Id":"client:1","Tickers":null}"#).unwrap();
        assert!(req.items.is_empty());

        let change: ChangeNotification = serde_json::from_str(r#"{"Changes":null}"#).unwrap();
        assert!(change.changes.is_empty());
    }

    #[test]
    fn test_heartbeat_wire_fields() {
        let hb = Heartbeat {
            sequence: 3,
            sent_at: Timestamp::new(100, 42),
        };
        let json = serde_json::to_string(&hb).unwrap();
        assert_eq!(json, r#"{"Sequence":3,"Seconds":100,"Nanos":42}"#);
    }
}
