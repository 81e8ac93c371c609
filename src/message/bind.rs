//! Session binding: attach or detach a user to a gate or node.
//!
//! ```text
//! bind gate request:    header | cid (8) | uid (8)  = 30
//! unbind gate request:  header | uid (8)            = 22
//! bind node request:    header | uid (8)            = 22
//! unbind node request:  header | uid (8)            = 22
//! every response:       header | code (2)           = 16
//! ```

use bytes::Bytes;

use super::{control_writer, decode_code_res, encode_code_res, open_control};
use crate::error::Result;
use crate::protocol::{Route, StatusCode, CODE_BYTES, COMMON_HEADER_SIZE, ID_BYTES};

pub const BIND_GATE_REQ_BYTES: usize = COMMON_HEADER_SIZE + ID_BYTES + ID_BYTES;
pub const BIND_GATE_RES_BYTES: usize = COMMON_HEADER_SIZE + CODE_BYTES;
pub const UNBIND_GATE_REQ_BYTES: usize = COMMON_HEADER_SIZE + ID_BYTES;
pub const UNBIND_GATE_RES_BYTES: usize = COMMON_HEADER_SIZE + CODE_BYTES;
pub const BIND_NODE_REQ_BYTES: usize = COMMON_HEADER_SIZE + ID_BYTES;
pub const BIND_NODE_RES_BYTES: usize = COMMON_HEADER_SIZE + CODE_BYTES;
pub const UNBIND_NODE_REQ_BYTES: usize = COMMON_HEADER_SIZE + ID_BYTES;
pub const UNBIND_NODE_RES_BYTES: usize = COMMON_HEADER_SIZE + CODE_BYTES;

fn encode_uid_req(size: usize, route: Route, seq: u64, uid: i64) -> Bytes {
    let mut writer = control_writer(size, false, route, seq);
    writer.write_i64(uid);
    writer.finish()
}

fn decode_uid_req(data: &[u8], size: usize, route: Route) -> Result<(u64, i64)> {
    let (header, mut reader) = open_control(data, size, route)?;
    Ok((header.seq, reader.read_i64()?))
}

/// Encode a bind-gate request binding user `uid` to connection `cid`.
pub fn encode_bind_gate_req(seq: u64, cid: i64, uid: i64) -> Bytes {
    let mut writer = control_writer(BIND_GATE_REQ_BYTES, false, Route::BindGate, seq);
    writer.write_i64(cid);
    writer.write_i64(uid);
    writer.finish()
}

/// Decode a bind-gate request into `(seq, cid, uid)`.
pub fn decode_bind_gate_req(data: &[u8]) -> Result<(u64, i64, i64)> {
    let (header, mut reader) = open_control(data, BIND_GATE_REQ_BYTES, Route::BindGate)?;
    let cid = reader.read_i64()?;
    let uid = reader.read_i64()?;
    Ok((header.seq, cid, uid))
}

pub fn encode_bind_gate_res(seq: u64, code: StatusCode) -> Bytes {
    encode_code_res(BIND_GATE_RES_BYTES, Route::BindGate, seq, code)
}

pub fn decode_bind_gate_res(data: &[u8]) -> Result<StatusCode> {
    decode_code_res(data, BIND_GATE_RES_BYTES, Route::BindGate)
}

pub fn encode_unbind_gate_req(seq: u64, uid: i64) -> Bytes {
    encode_uid_req(UNBIND_GATE_REQ_BYTES, Route::UnbindGate, seq, uid)
}

/// Decode an unbind-gate request into `(seq, uid)`.
pub fn decode_unbind_gate_req(data: &[u8]) -> Result<(u64, i64)> {
    decode_uid_req(data, UNBIND_GATE_REQ_BYTES, Route::UnbindGate)
}

pub fn encode_unbind_gate_res(seq: u64, code: StatusCode) -> Bytes {
    encode_code_res(UNBIND_GATE_RES_BYTES, Route::UnbindGate, seq, code)
}

pub fn decode_unbind_gate_res(data: &[u8]) -> Result<StatusCode> {
    decode_code_res(data, UNBIND_GATE_RES_BYTES, Route::UnbindGate)
}

pub fn encode_bind_node_req(seq: u64, uid: i64) -> Bytes {
    encode_uid_req(BIND_NODE_REQ_BYTES, Route::BindNode, seq, uid)
}

/// Decode a bind-node request into `(seq, uid)`.
pub fn decode_bind_node_req(data: &[u8]) -> Result<(u64, i64)> {
    decode_uid_req(data, BIND_NODE_REQ_BYTES, Route::BindNode)
}

pub fn encode_bind_node_res(seq: u64, code: StatusCode) -> Bytes {
    encode_code_res(BIND_NODE_RES_BYTES, Route::BindNode, seq, code)
}

pub fn decode_bind_node_res(data: &[u8]) -> Result<StatusCode> {
    decode_code_res(data, BIND_NODE_RES_BYTES, Route::BindNode)
}

pub fn encode_unbind_node_req(seq: u64, uid: i64) -> Bytes {
    encode_uid_req(UNBIND_NODE_REQ_BYTES, Route::UnbindNode, seq, uid)
}

/// Decode an unbind-node request into `(seq, uid)`.
pub fn decode_unbind_node_req(data: &[u8]) -> Result<(u64, i64)> {
    decode_uid_req(data, UNBIND_NODE_REQ_BYTES, Route::UnbindNode)
}

pub fn encode_unbind_node_res(seq: u64, code: StatusCode) -> Bytes {
    encode_code_res(UNBIND_NODE_RES_BYTES, Route::UnbindNode, seq, code)
}

pub fn decode_unbind_node_res(data: &[u8]) -> Result<StatusCode> {
    decode_code_res(data, UNBIND_NODE_RES_BYTES, Route::UnbindNode)
}
