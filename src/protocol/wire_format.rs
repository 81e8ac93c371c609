//! Frame layout constants and the common frame header.
//!
//! Every frame starts with the same 14-byte header:
//! ```text
//! ┌────────────┬───────┬───────┬──────────┐
//! │ total_size │ flags │ route │ sequence │
//! │ 4 bytes    │ 1 byte│ 1 byte│ 8 bytes  │
//! │ uint32 BE  │       │       │ uint64 BE│
//! └────────────┴───────┴───────┴──────────┘
//! ```
//!
//! `total_size` counts every byte after itself, so a stream reader can read 4 bytes and then
//! exactly `total_size` more to isolate one frame.
//!
//! These widths are the single source of truth for every encoder and decoder in
//! [`message`](crate::message).

use std::io::SeekFrom;

use super::cursor::{Reader, Writer};
use crate::error::{ClusterwireError, Result};

/// Width of the `total_size` prefix.
pub const SIZE_BYTES: usize = 4;
/// Width of the flags byte.
pub const HEADER_BYTES: usize = 1;
/// Width of the route byte.
pub const ROUTE_BYTES: usize = 1;
/// Width of the sequence number.
pub const SEQ_BYTES: usize = 8;
/// Width of a response status code.
pub const CODE_BYTES: usize = 2;

/// Width of a session kind tag.
pub const KIND_BYTES: usize = 1;
/// Width of an int64 identifier (connection, user or target id).
pub const ID_BYTES: usize = 8;
/// Width of a boolean field.
pub const BOOL_BYTES: usize = 1;
/// Width of a counter field.
pub const COUNT_BYTES: usize = 8;
/// Width of an IP address field (IPv6, IPv4 stored mapped).
pub const IP_BYTES: usize = 16;

/// Common header size (size + flags + route + sequence = 14 bytes).
pub const COMMON_HEADER_SIZE: usize = SIZE_BYTES + HEADER_BYTES + ROUTE_BYTES + SEQ_BYTES;

/// Default maximum frame size (16 MiB), counted as `total_size`.
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Reserved sequence for data frames that expect no response.
pub const NO_SEQUENCE: u64 = 0;

/// Flag constants for the header byte.
pub mod flags {
    /// Data frame: opaque application payload (no bits set).
    pub const DATA: u8 = 0b0000_0000;
    /// Control frame: one of the catalog operations.
    pub const CONTROL: u8 = 0b0000_0001;
    /// Response: the frame answers a request with the same sequence.
    pub const RESPONSE: u8 = 0b0000_0010;

    /// Reserved bits mask (bits 2-7).
    pub const RESERVED_MASK: u8 = 0b1111_1100;

    /// Control request flags.
    pub const CONTROL_REQUEST: u8 = CONTROL;
    /// Control response flags.
    pub const CONTROL_RESPONSE: u8 = CONTROL | RESPONSE;
    /// Data response flags.
    pub const DATA_RESPONSE: u8 = DATA | RESPONSE;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Decoded common header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Byte length of everything after the size field.
    pub total_size: u32,
    /// Flags byte (see [`flags`]).
    pub flags: u8,
    /// Operation code (control frames) or application route (data frames).
    pub route: u8,
    /// Correlation id, echoed verbatim in the response.
    pub seq: u64,
}

impl Header {
    pub fn new(total_size: u32, flags: u8, route: u8, seq: u64) -> Self {
        Self {
            total_size,
            flags,
            route,
            seq,
        }
    }

    /// Build the header of a frame whose full encoded length is `frame_len`.
    ///
    /// `total_size` is derived from the length, never passed in. Fails if the frame is too
    /// long for the 32-bit size field.
    pub fn for_frame(frame_len: usize, flags: u8, route: u8, seq: u64) -> Result<Self> {
        debug_assert!(frame_len >= COMMON_HEADER_SIZE);
        let total_size = u32::try_from(frame_len - SIZE_BYTES).map_err(|_| {
            ClusterwireError::Protocol(format!(
                "frame of {} bytes does not fit the size field",
                frame_len
            ))
        })?;
        Ok(Self::new(total_size, flags, route, seq))
    }

    /// Full encoded length of the frame this header describes.
    #[inline]
    pub fn frame_len(&self) -> usize {
        SIZE_BYTES + self.total_size as usize
    }

    /// Write the header through a cursor writer.
    pub fn write_to(&self, writer: &mut Writer) {
        writer.write_u32(self.total_size);
        writer.write_u8(self.flags);
        writer.write_u8(self.route);
        writer.write_u64(self.seq);
    }

    /// Read the header from the start of a cursor reader.
    pub fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            total_size: reader.read_u32()?,
            flags: reader.read_u8()?,
            route: reader.read_u8()?,
            seq: reader.read_u64()?,
        })
    }

    /// Decode just the common header of a complete frame span.
    ///
    /// Checks that the span is long enough, that `total_size` agrees with the span length and
    /// that no reserved flag bits are set. Operation-specific fields are not touched.
    pub fn peek(data: &[u8]) -> Result<Self> {
        if data.len() < COMMON_HEADER_SIZE {
            return Err(ClusterwireError::InvalidMessage(format!(
                "frame of {} bytes is shorter than the {} byte header",
                data.len(),
                COMMON_HEADER_SIZE
            )));
        }

        let header = Self::read_from(&mut Reader::new(data))?;

        if header.frame_len() != data.len() {
            return Err(ClusterwireError::InvalidMessage(format!(
                "total_size {} does not match a {} byte frame",
                header.total_size,
                data.len()
            )));
        }

        header.validate()?;
        Ok(header)
    }

    /// Validate the header for protocol compliance.
    ///
    /// Checks:
    /// - Reserved flag bits are 0
    /// - Route 0 is not used
    pub fn validate(&self) -> Result<()> {
        if self.flags & flags::RESERVED_MASK != 0 {
            return Err(ClusterwireError::InvalidMessage(
                "Reserved flag bits must be 0".to_string(),
            ));
        }

        if self.route == 0 {
            return Err(ClusterwireError::InvalidMessage(
                "Route 0 is reserved".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if this is a control frame.
    #[inline]
    pub fn is_control(&self) -> bool {
        flags::has_flag(self.flags, flags::CONTROL)
    }

    /// Check if this is a response.
    #[inline]
    pub fn is_response(&self) -> bool {
        flags::has_flag(self.flags, flags::RESPONSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(header: &Header, len: usize) -> Vec<u8> {
        let mut writer = Writer::with_size(len);
        header.write_to(&mut writer);
        writer.write_slice(&vec![0u8; len - COMMON_HEADER_SIZE]);
        writer.finish().to_vec()
    }

    #[test]
    fn test_common_header_size_is_14() {
        assert_eq!(COMMON_HEADER_SIZE, 14);
    }

    #[test]
    fn test_for_frame_derives_total_size() {
        let header = Header::for_frame(24, flags::CONTROL_REQUEST, 6, 42).unwrap();
        assert_eq!(header.total_size, 20);
        assert_eq!(header.frame_len(), 24);
    }

    #[test]
    fn test_for_frame_rejects_size_overflow() {
        let too_long = u32::MAX as usize + SIZE_BYTES + 1;
        assert!(matches!(
            Header::for_frame(too_long, flags::DATA, 20, 1),
            Err(ClusterwireError::Protocol(_))
        ));

        let largest = Header::for_frame(u32::MAX as usize + SIZE_BYTES, flags::DATA, 20, 1);
        assert_eq!(largest.unwrap().total_size, u32::MAX);
    }

    #[test]
    fn test_header_big_endian_byte_order() {
        let header = Header::for_frame(COMMON_HEADER_SIZE, 0x03, 0x07, 0x0102030405060708).unwrap();
        let bytes = encode(&header, COMMON_HEADER_SIZE);

        assert_eq!(&bytes[0..4], &[0, 0, 0, 10]);
        assert_eq!(bytes[4], 0x03);
        assert_eq!(bytes[5], 0x07);
        assert_eq!(&bytes[6..14], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_peek_roundtrip() {
        let header = Header::for_frame(30, flags::DATA_RESPONSE, 9, u64::MAX).unwrap();
        let bytes = encode(&header, 30);
        assert_eq!(Header::peek(&bytes).unwrap(), header);
    }

    #[test]
    fn test_peek_rejects_short_span() {
        let bytes = [0u8; COMMON_HEADER_SIZE - 1];
        assert!(matches!(
            Header::peek(&bytes),
            Err(ClusterwireError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_peek_rejects_size_mismatch() {
        let header = Header::for_frame(16, flags::CONTROL_RESPONSE, 1, 1).unwrap();
        let mut bytes = encode(&header, 16);
        bytes.push(0);

        let err = Header::peek(&bytes).unwrap_err();
        assert!(err.to_string().contains("total_size"));
    }

    #[test]
    fn test_validate_reserved_bits_must_be_zero() {
        let header = Header::for_frame(14, 0b1000_0000, 1, 1).unwrap();
        let result = header.validate();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Reserved flag bits"));
    }

    #[test]
    fn test_validate_route_zero_rejected() {
        let header = Header::for_frame(14, flags::CONTROL, 0, 1).unwrap();
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_flag_combinations() {
        assert_eq!(flags::CONTROL_REQUEST, 0x01);
        assert_eq!(flags::CONTROL_RESPONSE, 0x03);
        assert_eq!(flags::DATA_RESPONSE, 0x02);

        let header = Header::for_frame(16, flags::CONTROL_RESPONSE, 6, 1).unwrap();
        assert!(header.is_control());
        assert!(header.is_response());

        let data = Header::for_frame(30, flags::DATA, 6, 1).unwrap();
        assert!(!data.is_control());
        assert!(!data.is_response());
    }
}
