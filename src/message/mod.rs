//! Message catalog - encode/decode functions for every control operation.
//!
//! Each operation supplies four functions: `encode_<op>_req`, `decode_<op>_req`,
//! `encode_<op>_res` and `decode_<op>_res`. They all follow the same contract:
//!
//! - Encoders allocate a [`Writer`] of the exact frame size declared for the operation, write
//!   the common header (with `total_size` derived from that size) and then the operation's
//!   fields in layout order.
//! - Decoders first check that the span has exactly the declared size and carries the
//!   operation's route. Anything else is an [`InvalidMessage`](ClusterwireError::InvalidMessage).
//!   Request decoders then seek past the common header and read forward; response decoders
//!   seek from the end to the trailing status code.
//!
//! [`ControlRequest`] and [`ControlReply`] are the typed views used by the connection runtime
//! to dispatch on the route byte.
//!
//! # Example
//!
//! ```
//! use clusterwire::message::{decode_disconnect_req, encode_disconnect_req};
//! use clusterwire::protocol::SessionKind;
//!
//! let bytes = encode_disconnect_req(42, SessionKind::Conn, 1001, true);
//! assert_eq!(bytes.len(), 24);
//!
//! let (seq, kind, target, is_force) = decode_disconnect_req(&bytes).unwrap();
//! assert_eq!((seq, kind, target, is_force), (42, SessionKind::Conn, 1001, true));
//! ```

mod bind;
mod data;
mod disconnect;
mod heartbeat;
mod ip;
mod stat;

use std::io::SeekFrom;
use std::net::{IpAddr, Ipv4Addr};

use bytes::Bytes;

use crate::error::{ClusterwireError, Result};
use crate::protocol::{
    flags, Header, Reader, Route, SessionKind, StatusCode, Writer, CODE_BYTES, COMMON_HEADER_SIZE,
    SIZE_BYTES,
};

pub use bind::{
    decode_bind_gate_req, decode_bind_gate_res, decode_bind_node_req, decode_bind_node_res,
    decode_unbind_gate_req, decode_unbind_gate_res, decode_unbind_node_req,
    decode_unbind_node_res, encode_bind_gate_req, encode_bind_gate_res, encode_bind_node_req,
    encode_bind_node_res, encode_unbind_gate_req, encode_unbind_gate_res,
    encode_unbind_node_req, encode_unbind_node_res, BIND_GATE_REQ_BYTES, BIND_GATE_RES_BYTES,
    BIND_NODE_REQ_BYTES, BIND_NODE_RES_BYTES, UNBIND_GATE_REQ_BYTES, UNBIND_GATE_RES_BYTES,
    UNBIND_NODE_REQ_BYTES, UNBIND_NODE_RES_BYTES,
};
pub use data::{data_total_size, decode_data, encode_data, DataFrame, DATA_PREFIX_BYTES};
pub use disconnect::{
    decode_disconnect_req, decode_disconnect_res, encode_disconnect_req, encode_disconnect_res,
    DISCONNECT_REQ_BYTES, DISCONNECT_RES_BYTES,
};
pub use heartbeat::{
    decode_heartbeat_req, decode_heartbeat_res, encode_heartbeat_req, encode_heartbeat_res,
    HEARTBEAT_REQ_BYTES, HEARTBEAT_RES_BYTES,
};
pub use ip::{
    decode_get_ip_req, decode_get_ip_res, encode_get_ip_req, encode_get_ip_res,
    GET_IP_REQ_BYTES, GET_IP_RES_BYTES,
};
pub use stat::{
    decode_stat_req, decode_stat_res, encode_stat_req, encode_stat_res, STAT_REQ_BYTES,
    STAT_RES_BYTES,
};

/// Start a control frame of exactly `size` bytes with its common header written.
pub(crate) fn control_writer(size: usize, response: bool, route: Route, seq: u64) -> Writer {
    let frame_flags = if response {
        flags::CONTROL_RESPONSE
    } else {
        flags::CONTROL_REQUEST
    };

    // Catalog frames are a few dozen bytes, far below the size field's limit.
    let header = Header::new((size - SIZE_BYTES) as u32, frame_flags, route.code(), seq);

    let mut writer = Writer::with_size(size);
    header.write_to(&mut writer);
    writer
}

/// Validate a control span against the declared size and route.
///
/// Returns the decoded header and a reader positioned just after it.
pub(crate) fn open_control(data: &[u8], size: usize, route: Route) -> Result<(Header, Reader<'_>)> {
    if data.len() != size {
        return Err(ClusterwireError::length_mismatch(route.name(), size, data.len()));
    }

    let header = Header::peek(data)?;
    if header.route != route.code() {
        return Err(ClusterwireError::InvalidMessage(format!(
            "expected route {} ({}), got {}",
            route.code(),
            route,
            header.route
        )));
    }

    let mut reader = Reader::new(data);
    reader.seek(SeekFrom::Start(COMMON_HEADER_SIZE as u64))?;
    Ok((header, reader))
}

/// Read the trailing status code of an already validated response.
pub(crate) fn read_trailing_code(reader: &mut Reader<'_>) -> Result<StatusCode> {
    reader.seek(SeekFrom::End(-(CODE_BYTES as i64)))?;
    Ok(StatusCode(reader.read_i16()?))
}

/// Encode a response that carries nothing but a status code.
pub(crate) fn encode_code_res(size: usize, route: Route, seq: u64, code: StatusCode) -> Bytes {
    let mut writer = control_writer(size, true, route, seq);
    writer.write_i16(code.code());
    writer.finish()
}

/// Decode a response that carries nothing but a status code.
pub(crate) fn decode_code_res(data: &[u8], size: usize, route: Route) -> Result<StatusCode> {
    let (_, mut reader) = open_control(data, size, route)?;
    read_trailing_code(&mut reader)
}

/// Generic response reader: extract the status code of any control response.
///
/// Only the common header is validated, so this works without knowing the operation-specific
/// shape of the response.
pub fn decode_status(data: &[u8]) -> Result<StatusCode> {
    let header = Header::peek(data)?;
    if !header.is_control() || !header.is_response() {
        return Err(ClusterwireError::InvalidMessage(
            "not a control response".to_string(),
        ));
    }
    if data.len() < COMMON_HEADER_SIZE + CODE_BYTES {
        return Err(ClusterwireError::length_mismatch(
            "control response",
            COMMON_HEADER_SIZE + CODE_BYTES,
            data.len(),
        ));
    }

    read_trailing_code(&mut Reader::new(data))
}

/// A decoded control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    Heartbeat,
    BindGate { cid: i64, uid: i64 },
    UnbindGate { uid: i64 },
    BindNode { uid: i64 },
    UnbindNode { uid: i64 },
    Disconnect {
        kind: SessionKind,
        target: i64,
        is_force: bool,
    },
    Stat { kind: SessionKind },
    GetIp { kind: SessionKind, target: i64 },
}

impl ControlRequest {
    /// Route code owned by this operation.
    pub fn route(&self) -> Route {
        match self {
            ControlRequest::Heartbeat => Route::Heartbeat,
            ControlRequest::BindGate { .. } => Route::BindGate,
            ControlRequest::UnbindGate { .. } => Route::UnbindGate,
            ControlRequest::BindNode { .. } => Route::BindNode,
            ControlRequest::UnbindNode { .. } => Route::UnbindNode,
            ControlRequest::Disconnect { .. } => Route::Disconnect,
            ControlRequest::Stat { .. } => Route::Stat,
            ControlRequest::GetIp { .. } => Route::GetIp,
        }
    }

    /// Encode the request frame with the given sequence.
    pub fn encode(&self, seq: u64) -> Bytes {
        match *self {
            ControlRequest::Heartbeat => encode_heartbeat_req(seq),
            ControlRequest::BindGate { cid, uid } => encode_bind_gate_req(seq, cid, uid),
            ControlRequest::UnbindGate { uid } => encode_unbind_gate_req(seq, uid),
            ControlRequest::BindNode { uid } => encode_bind_node_req(seq, uid),
            ControlRequest::UnbindNode { uid } => encode_unbind_node_req(seq, uid),
            ControlRequest::Disconnect {
                kind,
                target,
                is_force,
            } => encode_disconnect_req(seq, kind, target, is_force),
            ControlRequest::Stat { kind } => encode_stat_req(seq, kind),
            ControlRequest::GetIp { kind, target } => encode_get_ip_req(seq, kind, target),
        }
    }

    /// Decode any control request, dispatching on its route byte.
    ///
    /// Returns the sequence alongside the typed request.
    pub fn decode(data: &[u8]) -> Result<(u64, Self)> {
        let header = Header::peek(data)?;
        if !header.is_control() || header.is_response() {
            return Err(ClusterwireError::InvalidMessage(
                "not a control request".to_string(),
            ));
        }

        let decoded = match Route::try_from(header.route)? {
            Route::Heartbeat => (decode_heartbeat_req(data)?, ControlRequest::Heartbeat),
            Route::BindGate => {
                let (seq, cid, uid) = decode_bind_gate_req(data)?;
                (seq, ControlRequest::BindGate { cid, uid })
            }
            Route::UnbindGate => {
                let (seq, uid) = decode_unbind_gate_req(data)?;
                (seq, ControlRequest::UnbindGate { uid })
            }
            Route::BindNode => {
                let (seq, uid) = decode_bind_node_req(data)?;
                (seq, ControlRequest::BindNode { uid })
            }
            Route::UnbindNode => {
                let (seq, uid) = decode_unbind_node_req(data)?;
                (seq, ControlRequest::UnbindNode { uid })
            }
            Route::Disconnect => {
                let (seq, kind, target, is_force) = decode_disconnect_req(data)?;
                (
                    seq,
                    ControlRequest::Disconnect {
                        kind,
                        target,
                        is_force,
                    },
                )
            }
            Route::Stat => {
                let (seq, kind) = decode_stat_req(data)?;
                (seq, ControlRequest::Stat { kind })
            }
            Route::GetIp => {
                let (seq, kind, target) = decode_get_ip_req(data)?;
                (seq, ControlRequest::GetIp { kind, target })
            }
        };

        Ok(decoded)
    }
}

/// A control response body, shaped by the route it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    /// Status-only response (heartbeat, bind/unbind, disconnect).
    Status(StatusCode),
    /// Session count.
    Stat { total: u64, code: StatusCode },
    /// Remote address of a session.
    Ip { ip: IpAddr, code: StatusCode },
}

impl ControlReply {
    /// The trailing status code.
    pub fn code(&self) -> StatusCode {
        match *self {
            ControlReply::Status(code) => code,
            ControlReply::Stat { code, .. } => code,
            ControlReply::Ip { code, .. } => code,
        }
    }

    /// A reply of the right shape for `route` carrying only `code`.
    pub fn status_for(route: Route, code: StatusCode) -> Self {
        match route {
            Route::Stat => ControlReply::Stat { total: 0, code },
            Route::GetIp => ControlReply::Ip {
                ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                code,
            },
            _ => ControlReply::Status(code),
        }
    }

    /// Encode the response frame for `route`.
    ///
    /// Fails if the reply's shape does not belong to the route.
    pub fn encode(&self, route: Route, seq: u64) -> Result<Bytes> {
        let bytes = match (route, *self) {
            (Route::Heartbeat, ControlReply::Status(code)) => encode_heartbeat_res(seq, code),
            (Route::BindGate, ControlReply::Status(code)) => encode_bind_gate_res(seq, code),
            (Route::UnbindGate, ControlReply::Status(code)) => encode_unbind_gate_res(seq, code),
            (Route::BindNode, ControlReply::Status(code)) => encode_bind_node_res(seq, code),
            (Route::UnbindNode, ControlReply::Status(code)) => encode_unbind_node_res(seq, code),
            (Route::Disconnect, ControlReply::Status(code)) => encode_disconnect_res(seq, code),
            (Route::Stat, ControlReply::Stat { total, code }) => encode_stat_res(seq, total, code),
            (Route::GetIp, ControlReply::Ip { ip, code }) => encode_get_ip_res(seq, ip, code),
            (route, reply) => {
                return Err(ClusterwireError::Protocol(format!(
                    "reply {:?} does not fit route {}",
                    reply, route
                )))
            }
        };
        Ok(bytes)
    }

    /// Decode the response frame for `route`.
    pub fn decode(route: Route, data: &[u8]) -> Result<Self> {
        let reply = match route {
            Route::Heartbeat => ControlReply::Status(decode_heartbeat_res(data)?),
            Route::BindGate => ControlReply::Status(decode_bind_gate_res(data)?),
            Route::UnbindGate => ControlReply::Status(decode_unbind_gate_res(data)?),
            Route::BindNode => ControlReply::Status(decode_bind_node_res(data)?),
            Route::UnbindNode => ControlReply::Status(decode_unbind_node_res(data)?),
            Route::Disconnect => ControlReply::Status(decode_disconnect_res(data)?),
            Route::Stat => {
                let (total, code) = decode_stat_res(data)?;
                ControlReply::Stat { total, code }
            }
            Route::GetIp => {
                let (ip, code) = decode_get_ip_res(data)?;
                ControlReply::Ip { ip, code }
            }
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SIZE_BYTES;

    fn all_requests() -> Vec<ControlRequest> {
        vec![
            ControlRequest::Heartbeat,
            ControlRequest::BindGate { cid: 3, uid: 9 },
            ControlRequest::UnbindGate { uid: 9 },
            ControlRequest::BindNode { uid: 9 },
            ControlRequest::UnbindNode { uid: 9 },
            ControlRequest::Disconnect {
                kind: SessionKind::User,
                target: 9,
                is_force: false,
            },
            ControlRequest::Stat {
                kind: SessionKind::Conn,
            },
            ControlRequest::GetIp {
                kind: SessionKind::Conn,
                target: 3,
            },
        ]
    }

    #[test]
    fn test_every_request_decodes_through_dispatch() {
        for (i, request) in all_requests().into_iter().enumerate() {
            let seq = 100 + i as u64;
            let bytes = request.encode(seq);

            assert_eq!(bytes.len() - SIZE_BYTES, Header::peek(&bytes).unwrap().total_size as usize);
            assert_eq!(ControlRequest::decode(&bytes).unwrap(), (seq, request));
        }
    }

    #[test]
    fn test_every_route_has_a_reply_shape() {
        for route in Route::ALL {
            let reply = ControlReply::status_for(route, StatusCode::NOT_FOUND_SESSION);
            let bytes = reply.encode(route, 5).unwrap();

            assert_eq!(ControlReply::decode(route, &bytes).unwrap(), reply);
            assert_eq!(decode_status(&bytes).unwrap(), StatusCode::NOT_FOUND_SESSION);
        }
    }

    #[test]
    fn test_reply_shape_mismatch() {
        let reply = ControlReply::Stat {
            total: 1,
            code: StatusCode::OK,
        };
        assert!(matches!(
            reply.encode(Route::Disconnect, 1),
            Err(ClusterwireError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_request_unknown_route() {
        let mut bytes = encode_heartbeat_req(1).to_vec();
        bytes[5] = 0x7F;
        assert!(matches!(
            ControlRequest::decode(&bytes),
            Err(ClusterwireError::UnknownRoute(0x7F))
        ));
    }

    #[test]
    fn test_decode_request_rejects_response() {
        let bytes = encode_disconnect_res(1, StatusCode::OK);
        assert!(matches!(
            ControlRequest::decode(&bytes),
            Err(ClusterwireError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_decode_status_rejects_request() {
        let bytes = encode_heartbeat_req(1);
        assert!(decode_status(&bytes).is_err());
    }

    #[test]
    fn test_decoder_rejects_other_route_of_same_size() {
        // unbind_gate and bind_node requests share a 22 byte layout
        let bytes = encode_unbind_gate_req(1, 77);
        assert_eq!(bytes.len(), BIND_NODE_REQ_BYTES);
        assert!(matches!(
            decode_bind_node_req(&bytes),
            Err(ClusterwireError::InvalidMessage(_))
        ));
    }
}
