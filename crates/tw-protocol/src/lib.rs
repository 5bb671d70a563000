//! tw-protocol: Wire protocol for tickwatch change notifications
//!
//! This crate defines the self-describing text frames exchanged between
//! the notification server and its subscribers, and the heartbeat timing
//! contract both ends of a connection agree on.

pub mod codec;
pub mod error;
pub mod frame;
pub mod liveness;
pub mod message;

pub use codec::{decode, encode};
pub use error::ProtocolError;
pub use frame::{RawFrame, SEPARATOR};
pub use liveness::{LivenessContract, DEFAULT_HEARTBEAT_INTERVAL, TIMEOUT_MULTIPLIER};
pub use message::{
    ChangeNotification, Heartbeat, HeartbeatAck, ItemChange, Message, MessageType,
    SubscriptionRequest, Timestamp,
};
