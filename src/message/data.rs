//! Data frames: application payloads routed between gate and node.
//!
//! ```text
//! header | cid (8) | uid (8) | payload (opaque, variable)
//! ```
//!
//! The route byte is an application route here, not a catalog operation. The payload is kept
//! apart from the fixed prefix so it can be written without copying.

use std::io::SeekFrom;

use bytes::Bytes;

use crate::error::{ClusterwireError, Result};
use crate::protocol::{
    flags, Frame, Header, Reader, Writer, COMMON_HEADER_SIZE, ID_BYTES, SIZE_BYTES,
};
use crate::writer::OutboundFrame;

/// Fixed part of every data frame: header, connection id and user id.
pub const DATA_PREFIX_BYTES: usize = COMMON_HEADER_SIZE + ID_BYTES + ID_BYTES;

/// A decoded data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    pub route: u8,
    pub seq: u64,
    pub is_response: bool,
    /// Gateway connection the data came from (or goes to).
    pub cid: i64,
    /// User bound to that connection, 0 if none.
    pub uid: i64,
    /// Application bytes, zero-copy slice of the received frame.
    pub payload: Bytes,
}

/// Encode a data frame.
///
/// The returned frame holds the 30 byte prefix and the payload as separate buffers. Fails if
/// the payload is too large for the 32-bit size field.
pub fn encode_data(
    is_response: bool,
    route: u8,
    seq: u64,
    cid: i64,
    uid: i64,
    payload: Bytes,
) -> Result<OutboundFrame> {
    let frame_flags = if is_response {
        flags::DATA_RESPONSE
    } else {
        flags::DATA
    };
    let header = Header::for_frame(DATA_PREFIX_BYTES + payload.len(), frame_flags, route, seq)?;

    let mut writer = Writer::with_size(DATA_PREFIX_BYTES);
    header.write_to(&mut writer);
    writer.write_i64(cid);
    writer.write_i64(uid);

    Ok(OutboundFrame::new(writer.finish(), payload))
}

/// `total_size` of a data frame carrying `payload_len` bytes.
pub fn data_total_size(payload_len: usize) -> usize {
    DATA_PREFIX_BYTES - SIZE_BYTES + payload_len
}

/// Decode a parsed data frame.
pub fn decode_data(frame: &Frame) -> Result<DataFrame> {
    if frame.is_control() {
        return Err(ClusterwireError::InvalidMessage(
            "control frame decoded as data".to_string(),
        ));
    }
    if frame.len() < DATA_PREFIX_BYTES {
        return Err(ClusterwireError::length_mismatch(
            "data frame",
            DATA_PREFIX_BYTES,
            frame.len(),
        ));
    }

    let mut reader = Reader::new(frame.as_bytes());
    reader.seek(SeekFrom::Start(COMMON_HEADER_SIZE as u64))?;
    let cid = reader.read_i64()?;
    let uid = reader.read_i64()?;

    Ok(DataFrame {
        route: frame.route(),
        seq: frame.seq(),
        is_response: frame.is_response(),
        cid,
        uid,
        payload: frame.raw_bytes().slice(DATA_PREFIX_BYTES..),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::encode_heartbeat_req;

    #[test]
    fn test_prefix_size() {
        assert_eq!(DATA_PREFIX_BYTES, 30);
    }

    #[test]
    fn test_encode_data_layout() {
        let out = encode_data(false, 20, 0, 5, 6, Bytes::from_static(b"hello")).unwrap();

        assert_eq!(out.head.len(), 30);
        assert_eq!(out.size(), 35);

        let bytes = out.to_vec();
        let header = Header::peek(&bytes).unwrap();
        assert_eq!(header.total_size, 31);
        assert_eq!(header.flags, flags::DATA);
        assert_eq!(header.route, 20);
        assert_eq!(&bytes[30..], b"hello");
    }

    #[test]
    fn test_data_total_size() {
        assert_eq!(data_total_size(0), 26);
        assert_eq!(data_total_size(5), 31);
    }

    #[test]
    fn test_decode_data() {
        let bytes = encode_data(true, 20, 9, -1, 77, Bytes::from_static(b"{\"a\":1}"))
            .unwrap()
            .to_vec();
        let frame = Frame::parse(Bytes::from(bytes)).unwrap();
        let data = decode_data(&frame).unwrap();

        assert_eq!(data.route, 20);
        assert_eq!(data.seq, 9);
        assert!(data.is_response);
        assert_eq!((data.cid, data.uid), (-1, 77));
        assert_eq!(&data.payload[..], b"{\"a\":1}");
    }

    #[test]
    fn test_empty_payload() {
        let bytes = encode_data(false, 1, 0, 1, 2, Bytes::new()).unwrap().to_vec();
        let frame = Frame::parse(Bytes::from(bytes)).unwrap();
        assert!(decode_data(&frame).unwrap().payload.is_empty());
    }

    #[test]
    fn test_rejects_control_frame() {
        let frame = Frame::parse(encode_heartbeat_req(1)).unwrap();
        assert!(decode_data(&frame).is_err());
    }

    #[test]
    fn test_rejects_short_data_frame() {
        let mut writer = Writer::with_size(22);
        Header::for_frame(22, flags::DATA, 3, 1)
            .unwrap()
            .write_to(&mut writer);
        writer.write_i64(1);
        let frame = Frame::parse(writer.finish()).unwrap();

        assert!(matches!(
            decode_data(&frame),
            Err(ClusterwireError::InvalidMessage(_))
        ));
    }
}
