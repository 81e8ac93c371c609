//! Protocol module - frame layout, cursor codec, and frame types.
//!
//! This module implements the byte-level grammar shared by every message kind:
//! - 14-byte common header and layout constants
//! - Cursor writer/reader used by every encoder and decoder
//! - Route registry, session kinds and status codes
//! - Frame buffer for isolating frames from a byte stream

mod cursor;
mod frame;
mod frame_buffer;
mod route;
mod session;
mod status;
mod wire_format;

pub use cursor::{Reader, Writer};
pub use frame::Frame;
pub use frame_buffer::FrameBuffer;
pub use route::Route;
pub use session::SessionKind;
pub use status::StatusCode;
pub use wire_format::{
    flags, Header, BOOL_BYTES, CODE_BYTES, COMMON_HEADER_SIZE, COUNT_BYTES,
    DEFAULT_MAX_FRAME_SIZE, HEADER_BYTES, ID_BYTES, IP_BYTES, KIND_BYTES, NO_SEQUENCE,
    ROUTE_BYTES, SEQ_BYTES, SIZE_BYTES,
};
