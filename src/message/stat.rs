//! Stat: count the sessions of one kind.
//!
//! ```text
//! request:  header | session kind (1)         = 15
//! response: header | total (8) | code (2)     = 24
//! ```

use std::io::SeekFrom;

use bytes::Bytes;

use super::{control_writer, open_control, read_trailing_code};
use crate::error::Result;
use crate::protocol::{
    Route, SessionKind, StatusCode, CODE_BYTES, COMMON_HEADER_SIZE, COUNT_BYTES, KIND_BYTES,
};

pub const STAT_REQ_BYTES: usize = COMMON_HEADER_SIZE + KIND_BYTES;
pub const STAT_RES_BYTES: usize = COMMON_HEADER_SIZE + COUNT_BYTES + CODE_BYTES;

pub fn encode_stat_req(seq: u64, kind: SessionKind) -> Bytes {
    let mut writer = control_writer(STAT_REQ_BYTES, false, Route::Stat, seq);
    writer.write_u8(kind.code());
    writer.finish()
}

/// Decode a stat request into `(seq, kind)`.
pub fn decode_stat_req(data: &[u8]) -> Result<(u64, SessionKind)> {
    let (header, mut reader) = open_control(data, STAT_REQ_BYTES, Route::Stat)?;
    let kind = SessionKind::try_from(reader.read_u8()?)?;
    Ok((header.seq, kind))
}

pub fn encode_stat_res(seq: u64, total: u64, code: StatusCode) -> Bytes {
    let mut writer = control_writer(STAT_RES_BYTES, true, Route::Stat, seq);
    writer.write_u64(total);
    writer.write_i16(code.code());
    writer.finish()
}

/// Decode a stat response into `(total, code)`.
pub fn decode_stat_res(data: &[u8]) -> Result<(u64, StatusCode)> {
    let (_, mut reader) = open_control(data, STAT_RES_BYTES, Route::Stat)?;
    let code = read_trailing_code(&mut reader)?;
    reader.seek(SeekFrom::Start(COMMON_HEADER_SIZE as u64))?;
    let total = reader.read_u64()?;
    Ok((total, code))
}
