//! Disconnect: force or gracefully close a session.
//!
//! ```text
//! request:  size | flags | route | seq | session kind (1) | target (8) | is_force (1)  = 24
//! response: size | flags | route | seq | code (2)                                     = 16
//! ```

use bytes::Bytes;

use super::{control_writer, open_control, read_trailing_code};
use crate::error::Result;
use crate::protocol::{
    Route, SessionKind, StatusCode, BOOL_BYTES, CODE_BYTES, COMMON_HEADER_SIZE, ID_BYTES,
    KIND_BYTES,
};

/// Disconnect request size.
pub const DISCONNECT_REQ_BYTES: usize = COMMON_HEADER_SIZE + KIND_BYTES + ID_BYTES + BOOL_BYTES;
/// Disconnect response size.
pub const DISCONNECT_RES_BYTES: usize = COMMON_HEADER_SIZE + CODE_BYTES;

/// Encode a disconnect request.
///
/// `is_force` severs the connection immediately; otherwise the peer closes it once buffered
/// outbound data has been flushed.
pub fn encode_disconnect_req(seq: u64, kind: SessionKind, target: i64, is_force: bool) -> Bytes {
    let mut writer = control_writer(DISCONNECT_REQ_BYTES, false, Route::Disconnect, seq);
    writer.write_u8(kind.code());
    writer.write_i64(target);
    writer.write_bool(is_force);
    writer.finish()
}

/// Decode a disconnect request into `(seq, kind, target, is_force)`.
pub fn decode_disconnect_req(data: &[u8]) -> Result<(u64, SessionKind, i64, bool)> {
    let (header, mut reader) = open_control(data, DISCONNECT_REQ_BYTES, Route::Disconnect)?;

    let kind = SessionKind::try_from(reader.read_u8()?)?;
    let target = reader.read_i64()?;
    let is_force = reader.read_bool()?;

    Ok((header.seq, kind, target, is_force))
}

/// Encode a disconnect response.
pub fn encode_disconnect_res(seq: u64, code: StatusCode) -> Bytes {
    let mut writer = control_writer(DISCONNECT_RES_BYTES, true, Route::Disconnect, seq);
    writer.write_i16(code.code());
    writer.finish()
}

/// Decode a disconnect response's status code.
pub fn decode_disconnect_res(data: &[u8]) -> Result<StatusCode> {
    let (_, mut reader) = open_control(data, DISCONNECT_RES_BYTES, Route::Disconnect)?;
    read_trailing_code(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterwireError;
    use crate::protocol::{flags, Header};

    #[test]
    fn test_sizes() {
        assert_eq!(DISCONNECT_REQ_BYTES, 24);
        assert_eq!(DISCONNECT_RES_BYTES, 16);
    }

    #[test]
    fn test_concrete_request_layout() {
        let bytes = encode_disconnect_req(42, SessionKind::Conn, 1001, true);

        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[0..4], &20u32.to_be_bytes());
        assert_eq!(bytes[4], flags::CONTROL_REQUEST);
        assert_eq!(bytes[5], Route::Disconnect.code());
        assert_eq!(&bytes[6..14], &42u64.to_be_bytes());
        assert_eq!(bytes[14], SessionKind::Conn.code());
        assert_eq!(&bytes[15..23], &1001i64.to_be_bytes());
        assert_eq!(bytes[23], 1);

        let decoded = decode_disconnect_req(&bytes).unwrap();
        assert_eq!(decoded, (42, SessionKind::Conn, 1001, true));
    }

    #[test]
    fn test_graceful_request() {
        let bytes = encode_disconnect_req(7, SessionKind::User, -5, false);
        assert_eq!(bytes[23], 0);
        assert_eq!(
            decode_disconnect_req(&bytes).unwrap(),
            (7, SessionKind::User, -5, false)
        );
    }

    #[test]
    fn test_request_length_guard() {
        let bytes = encode_disconnect_req(1, SessionKind::Gate, 2, true);

        let short = &bytes[..bytes.len() - 1];
        assert!(matches!(
            decode_disconnect_req(short),
            Err(ClusterwireError::InvalidMessage(_))
        ));

        let mut long = bytes.to_vec();
        long.push(0);
        assert!(matches!(
            decode_disconnect_req(&long),
            Err(ClusterwireError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_request_bad_session_kind() {
        let mut bytes = encode_disconnect_req(1, SessionKind::Node, 2, true).to_vec();
        bytes[14] = 9;
        assert!(matches!(
            decode_disconnect_req(&bytes),
            Err(ClusterwireError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_response_layout_and_code() {
        let bytes = encode_disconnect_res(42, StatusCode::NOT_FOUND_SESSION);

        assert_eq!(bytes.len(), 16);
        let header = Header::peek(&bytes).unwrap();
        assert_eq!(header.total_size, 12);
        assert_eq!(header.seq, 42);
        assert!(header.is_response());
        assert_eq!(&bytes[14..], &2i16.to_be_bytes());

        assert_eq!(
            decode_disconnect_res(&bytes).unwrap(),
            StatusCode::NOT_FOUND_SESSION
        );
    }

    #[test]
    fn test_response_negative_code() {
        let bytes = encode_disconnect_res(1, StatusCode(-300));
        assert_eq!(decode_disconnect_res(&bytes).unwrap(), StatusCode(-300));
    }

    #[test]
    fn test_response_checked_against_its_own_size() {
        let bytes = encode_disconnect_res(1, StatusCode::OK);

        assert!(decode_disconnect_res(&bytes[..15]).is_err());

        let mut long = bytes.to_vec();
        long.extend_from_slice(&[0; 8]);
        assert!(decode_disconnect_res(&long).is_err());
    }
}
