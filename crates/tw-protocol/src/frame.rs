//! Frame layout
//!
//! Every frame is `<type-tag><SEPARATOR><payload>`:
//! - type-tag: ASCII name of the message type (never contains the separator)
//! - separator: a single `:` byte
//! - payload: JSON encoding of the message body

use std::borrow::Cow;

use crate::error::ProtocolError;

/// Byte separating the type tag from the payload
pub const SEPARATOR: u8 = b':';

/// A frame split into its tag and payload, without interpreting either
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    /// Bytes before the first separator
    pub tag: &'a [u8],
    /// Bytes after the first separator
    pub payload: &'a [u8],
}

impl<'a> RawFrame<'a> {
    /// Split a frame at the first separator.
    ///
    /// Returns `MalformedFrame` if the frame has no separator at all.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ProtocolError> {
        let ix = bytes
            .iter()
            .position(|b| *b == SEPARATOR)
            .ok_or(ProtocolError::MalformedFrame)?;

        Ok(Self {
            tag: &bytes[..ix],
            payload: &bytes[ix + 1..],
        })
    }

    /// The tag as text, replacing invalid UTF-8
    pub fn tag_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_at_first_separator() {
        let frame = RawFrame::parse(br#"Ping:{"a":"b:c"}"#).unwrap();
        assert_eq!(frame.tag, b"Ping");
        assert_eq!(frame.payload, br#"{"a":"b:c"}"#);
    }

    #[test]
    fn test_parse_empty_parts() {
        let frame = RawFrame::parse(b":").unwrap();
        assert!(frame.tag.is_empty());
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_missing_separator() {
        let result = RawFrame::parse(b"Ping{}");
        assert!(matches!(result, Err(ProtocolError::MalformedFrame)));

        let result = RawFrame::parse(b"");
        assert!(matches!(result, Err(ProtocolError::MalformedFrame)));
    }

    #[test]
    fn test_tag_str_lossy() {
        let frame = RawFrame::parse(b"\xffPing:{}").unwrap();
        assert!(frame.tag_str().ends_with("Ping"));
    }
}
