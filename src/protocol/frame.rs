//! Inbound frame with typed header accessors.
//!
//! A [`Frame`] keeps the complete frame span (size prefix included) as `bytes::Bytes`, so
//! catalog decoders receive exactly the span they validate against and payload slices are
//! zero-copy views of the received buffer.
//!
//! # Example
//!
//! ```
//! use clusterwire::message::encode_disconnect_req;
//! use clusterwire::protocol::{Frame, Route, SessionKind};
//!
//! let bytes = encode_disconnect_req(42, SessionKind::Conn, 1001, true);
//! let frame = Frame::parse(bytes).unwrap();
//!
//! assert_eq!(frame.route(), Route::Disconnect.code());
//! assert_eq!(frame.seq(), 42);
//! assert!(frame.is_control());
//! ```

use bytes::Bytes;

use super::wire_format::{Header, COMMON_HEADER_SIZE};
use crate::error::Result;

/// A complete protocol frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded common header.
    pub header: Header,
    /// The whole frame, size prefix included.
    raw: Bytes,
}

impl Frame {
    /// Parse the common header of a complete frame span.
    pub fn parse(raw: Bytes) -> Result<Self> {
        let header = Header::peek(&raw)?;
        Ok(Self { header, raw })
    }

    /// The whole frame as received.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Cheap clone of the whole frame.
    #[inline]
    pub fn raw_bytes(&self) -> Bytes {
        self.raw.clone()
    }

    /// Bytes after the common header (zero-copy).
    #[inline]
    pub fn body(&self) -> Bytes {
        self.raw.slice(COMMON_HEADER_SIZE..)
    }

    /// Full frame length.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// A frame always carries at least the common header.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[inline]
    pub fn route(&self) -> u8 {
        self.header.route
    }

    #[inline]
    pub fn seq(&self) -> u64 {
        self.header.seq
    }

    #[inline]
    pub fn flags(&self) -> u8 {
        self.header.flags
    }

    /// Check if this is a control frame.
    #[inline]
    pub fn is_control(&self) -> bool {
        self.header.is_control()
    }

    /// Check if this is a response.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.header.is_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::cursor::Writer;
    use crate::protocol::flags;

    fn make_frame(flags: u8, route: u8, seq: u64, body: &[u8]) -> Bytes {
        let len = COMMON_HEADER_SIZE + body.len();
        let mut writer = Writer::with_size(len);
        Header::for_frame(len, flags, route, seq)
            .unwrap()
            .write_to(&mut writer);
        writer.write_slice(body);
        writer.finish()
    }

    #[test]
    fn test_frame_parse() {
        let frame = Frame::parse(make_frame(flags::CONTROL_RESPONSE, 6, 42, &[0, 0])).unwrap();

        assert_eq!(frame.route(), 6);
        assert_eq!(frame.seq(), 42);
        assert_eq!(frame.flags(), flags::CONTROL_RESPONSE);
        assert_eq!(frame.len(), 16);
        assert!(frame.is_control());
        assert!(frame.is_response());
    }

    #[test]
    fn test_frame_body_zero_copy() {
        let raw = make_frame(flags::DATA, 3, 7, b"payload");
        let frame = Frame::parse(raw.clone()).unwrap();

        let body = frame.body();
        assert_eq!(&body[..], b"payload");
        assert_eq!(body.as_ptr(), raw[COMMON_HEADER_SIZE..].as_ptr());
        assert_eq!(frame.raw_bytes().as_ptr(), raw.as_ptr());
    }

    #[test]
    fn test_frame_empty_body() {
        let frame = Frame::parse(make_frame(flags::CONTROL, 1, 1, b"")).unwrap();
        assert!(frame.body().is_empty());
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_frame_parse_rejects_bad_header() {
        let mut raw = make_frame(flags::CONTROL, 1, 1, b"").to_vec();
        raw[4] = 0x80;
        assert!(Frame::parse(Bytes::from(raw)).is_err());
    }
}
