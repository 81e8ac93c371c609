//! Heartbeat: liveness probe with an empty body.

use bytes::Bytes;

use super::{control_writer, decode_code_res, encode_code_res, open_control};
use crate::error::Result;
use crate::protocol::{Route, StatusCode, CODE_BYTES, COMMON_HEADER_SIZE};

/// Heartbeat request size (header only).
pub const HEARTBEAT_REQ_BYTES: usize = COMMON_HEADER_SIZE;
/// Heartbeat response size.
pub const HEARTBEAT_RES_BYTES: usize = COMMON_HEADER_SIZE + CODE_BYTES;

pub fn encode_heartbeat_req(seq: u64) -> Bytes {
    control_writer(HEARTBEAT_REQ_BYTES, false, Route::Heartbeat, seq).finish()
}

/// Decode a heartbeat request, returning its sequence.
pub fn decode_heartbeat_req(data: &[u8]) -> Result<u64> {
    let (header, _) = open_control(data, HEARTBEAT_REQ_BYTES, Route::Heartbeat)?;
    Ok(header.seq)
}

pub fn encode_heartbeat_res(seq: u64, code: StatusCode) -> Bytes {
    encode_code_res(HEARTBEAT_RES_BYTES, Route::Heartbeat, seq, code)
}

pub fn decode_heartbeat_res(data: &[u8]) -> Result<StatusCode> {
    decode_code_res(data, HEARTBEAT_RES_BYTES, Route::Heartbeat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_bare_header() {
        let bytes = encode_heartbeat_req(9);
        assert_eq!(bytes.len(), 14);
        assert_eq!(&bytes[0..4], &10u32.to_be_bytes());
        assert_eq!(decode_heartbeat_req(&bytes).unwrap(), 9);
    }

    #[test]
    fn test_response() {
        let bytes = encode_heartbeat_res(9, StatusCode::OK);
        assert_eq!(bytes.len(), HEARTBEAT_RES_BYTES);
        assert_eq!(decode_heartbeat_res(&bytes).unwrap(), StatusCode::OK);
    }

    #[test]
    fn test_length_guard() {
        let bytes = encode_heartbeat_res(9, StatusCode::OK);
        assert!(decode_heartbeat_res(&bytes[..HEARTBEAT_RES_BYTES - 1]).is_err());
        assert!(decode_heartbeat_req(&bytes).is_err());
    }
}
