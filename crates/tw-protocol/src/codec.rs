//! Text frame codec for protocol messages
//!
//! `encode` writes the message's type tag, the separator and the JSON body.
//! `decode` peels the tag off, looks it up in the static `MessageType`
//! registry and deserializes the rest into that variant.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::ProtocolError;
use crate::frame::{RawFrame, SEPARATOR};
use crate::message::{Message, MessageType};

/// Initial buffer size guess; payloads are usually small
const ENCODE_CAPACITY: usize = 128;

/// Encode a message as `<tag>:<json>`
pub fn encode(message: &Message) -> Result<Bytes, ProtocolError> {
    let tag = message.message_type().tag();
    let mut buf = BytesMut::with_capacity(ENCODE_CAPACITY);
    buf.put_slice(tag.as_bytes());
    buf.put_u8(SEPARATOR);

    match message {
        Message::SubscriptionRequest(body) => write_payload(&mut buf, body)?,
        Message::ChangeNotification(body) => write_payload(&mut buf, body)?,
        Message::Heartbeat(body) => write_payload(&mut buf, body)?,
        Message::HeartbeatAck(body) => write_payload(&mut buf, body)?,
    }

    Ok(buf.freeze())
}

/// Decode a frame produced by `encode`
pub fn decode(bytes: &[u8]) -> Result<Message, ProtocolError> {
    let frame = RawFrame::parse(bytes)?;

    let message_type = std::str::from_utf8(frame.tag)
        .ok()
        .and_then(MessageType::from_tag)
        .ok_or_else(|| ProtocolError::UnknownMessageType(frame.tag_str().into_owned()))?;

    let payload = frame.payload;
    let message = match message_type {
        MessageType::SubscriptionRequest => Message::SubscriptionRequest(read_payload(payload)?),
        MessageType::ChangeNotification => Message::ChangeNotification(read_payload(payload)?),
        MessageType::Heartbeat => Message::Heartbeat(read_payload(payload)?),
        MessageType::HeartbeatAck => Message::HeartbeatAck(read_payload(payload)?),
    };

    tracing::trace!(message_type = %message_type, len = bytes.len(), "Decoded frame");
    Ok(message)
}

fn write_payload<T: Serialize>(buf: &mut BytesMut, body: &T) -> Result<(), ProtocolError> {
    serde_json::to_writer(buf.writer(), body).map_err(ProtocolError::Encode)
}

fn read_payload<'a, T: serde::Deserialize<'a>>(payload: &'a [u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(payload).map_err(ProtocolError::PayloadDecode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{
        ChangeNotification, Heartbeat, HeartbeatAck, ItemChange, SubscriptionRequest, Timestamp,
    };

    fn roundtrip(message: Message) {
        let bytes = encode(&message).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_roundtrip_subscription_request() {
        roundtrip(
            SubscriptionRequest {
                identity: "client:4242".to_string(),
                items: vec!["AAPL".to_string(), "CSL.AX".to_string()],
            }
            .into(),
        );
    }

    #[test]
    fn test_roundtrip_empty_interest_set() {
        roundtrip(
            SubscriptionRequest {
                identity: String::new(),
                items: vec![],
            }
            .into(),
        );
    }

    #[test]
    fn test_roundtrip_change_notification() {
        roundtrip(
            ChangeNotification {
                changes: vec![
                    ItemChange {
                        name: "SPY".to_string(),
                        updated_at: 1_700_000_000,
                        value: 426.61,
                    },
                    ItemChange {
                        name: "QAN.AX".to_string(),
                        updated_at: 0,
                        value: -0.5,
                    },
                ],
            }
            .into(),
        );
    }

    #[test]
    fn test_roundtrip_zero_changes() {
        roundtrip(ChangeNotification::default().into());
    }

    #[test]
    fn test_roundtrip_heartbeat_pair() {
        let hb = Heartbeat {
            sequence: u64::MAX,
            sent_at: Timestamp::new(1_700_000_000, 999_999_999),
        };
        roundtrip(hb.into());
        roundtrip(
            HeartbeatAck {
                sequence: 0,
                sent_at: Timestamp::new(-5, 0),
            }
            .into(),
        );
    }

    #[test]
    fn test_encoded_layout() {
        let bytes = encode(
            &Heartbeat {
                sequence: 1,
                sent_at: Timestamp::new(2, 3),
            }
            .into(),
        )
        .unwrap();
        assert_eq!(&bytes[..], br#"Ping:{"Sequence":1,"Seconds":2,"Nanos":3}"#);
    }

    #[test]
    fn test_decode_peer_frame() {
        let frame = br#"TickerRequest:{"Id":"client:77 ","Tickers":["CMG","WPL.AX"]}"#;
        let message = decode(frame).unwrap();
        assert_eq!(
            message,
            Message::SubscriptionRequest(SubscriptionRequest {
                identity: "client:77 ".to_string(),
                items: vec!["CMG".to_string(), "WPL.AX".to_string()],
            })
        );
    }

    #[test]
    fn test_decode_missing_separator() {
        let result = decode(b"Ping{\"Sequence\":1}");
        assert!(matches!(result, Err(ProtocolError::MalformedFrame)));
    }

    #[test]
    fn test_decode_unknown_type() {
        let result = decode(b"Subscribe:{}");
        match result {
            Err(ProtocolError::UnknownMessageType(tag)) => assert_eq!(tag, "Subscribe"),
            other => panic!("Expected UnknownMessageType, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_bad_payload() {
        let result = decode(br#"Ping:{"Sequence":"seven","Seconds":1,"Nanos":0}"#);
        assert!(matches!(result, Err(ProtocolError::PayloadDecode(_))));

        let result = decode(b"TickerChange:not json");
        assert!(matches!(result, Err(ProtocolError::PayloadDecode(_))));

        let result = decode(b"Pong:");
        assert!(matches!(result, Err(ProtocolError::PayloadDecode(_))));
    }
}
