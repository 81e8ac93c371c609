//! GetIp: look up the remote address of a session.
//!
//! The address field is always 16 bytes. IPv4 addresses travel in their IPv4-mapped IPv6
//! form (`::ffff:a.b.c.d`) and come back out as [`IpAddr::V4`].
//!
//! ```text
//! request:  header | session kind (1) | target (8)   = 23
//! response: header | ip (16) | code (2)              = 32
//! ```

use std::net::{IpAddr, Ipv6Addr};

use bytes::Bytes;

use super::{control_writer, open_control, read_trailing_code};
use crate::error::Result;
use crate::protocol::{
    Route, SessionKind, StatusCode, CODE_BYTES, COMMON_HEADER_SIZE, ID_BYTES, IP_BYTES,
    KIND_BYTES,
};

pub const GET_IP_REQ_BYTES: usize = COMMON_HEADER_SIZE + KIND_BYTES + ID_BYTES;
pub const GET_IP_RES_BYTES: usize = COMMON_HEADER_SIZE + IP_BYTES + CODE_BYTES;

pub fn encode_get_ip_req(seq: u64, kind: SessionKind, target: i64) -> Bytes {
    let mut writer = control_writer(GET_IP_REQ_BYTES, false, Route::GetIp, seq);
    writer.write_u8(kind.code());
    writer.write_i64(target);
    writer.finish()
}

/// Decode a get-ip request into `(seq, kind, target)`.
pub fn decode_get_ip_req(data: &[u8]) -> Result<(u64, SessionKind, i64)> {
    let (header, mut reader) = open_control(data, GET_IP_REQ_BYTES, Route::GetIp)?;
    let kind = SessionKind::try_from(reader.read_u8()?)?;
    let target = reader.read_i64()?;
    Ok((header.seq, kind, target))
}

pub fn encode_get_ip_res(seq: u64, ip: IpAddr, code: StatusCode) -> Bytes {
    let octets = match ip {
        IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
        IpAddr::V6(v6) => v6.octets(),
    };

    let mut writer = control_writer(GET_IP_RES_BYTES, true, Route::GetIp, seq);
    writer.write_slice(&octets);
    writer.write_i16(code.code());
    writer.finish()
}

/// Decode a get-ip response into `(ip, code)`.
pub fn decode_get_ip_res(data: &[u8]) -> Result<(IpAddr, StatusCode)> {
    let (_, mut reader) = open_control(data, GET_IP_RES_BYTES, Route::GetIp)?;
    let octets = reader.read_array::<IP_BYTES>()?;
    let code = read_trailing_code(&mut reader)?;
    Ok((Ipv6Addr::from(octets).to_canonical(), code))
}
