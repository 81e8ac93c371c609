//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for isolating length-prefixed frames:
//! - `WaitingForSize`: Need at least 4 bytes
//! - `WaitingForBody`: Size parsed, need `total_size` more bytes
//!
//! Each isolated span includes its size prefix, ready for [`Frame::parse`](super::Frame::parse)
//! or a catalog decoder. Header validation is left to the caller so that one malformed frame
//! can be dropped without losing the stream.
//!
//! # Example
//!
//! ```
//! use clusterwire::message::encode_heartbeat_req;
//! use clusterwire::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//! let bytes = encode_heartbeat_req(1);
//!
//! assert!(buffer.push(&bytes[..3]).unwrap().is_empty());
//! let spans = buffer.push(&bytes[3..]).unwrap();
//! assert_eq!(spans.len(), 1);
//! assert_eq!(spans[0], bytes);
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{DEFAULT_MAX_FRAME_SIZE, SIZE_BYTES};
use crate::error::{ClusterwireError, Result};

/// State machine for frame isolation.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for the 4-byte size prefix.
    WaitingForSize,
    /// Size parsed, waiting for the rest of the frame.
    WaitingForBody { total_size: u32 },
}

/// Buffer for accumulating incoming bytes and extracting complete frame spans.
///
/// All data is stored in a single `BytesMut` buffer; extracted spans are frozen slices of it.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed `total_size`.
    max_frame_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 64KB, max frame: 16MB.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new frame buffer with a custom max frame size.
    pub fn with_max_frame_size(max_frame_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            state: State::WaitingForSize,
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frame spans.
    ///
    /// Partial data is kept for the next push.
    ///
    /// # Errors
    ///
    /// Returns error if a frame announces a size above `max_frame_size`. The stream cannot be
    /// re-synchronised after that, so the caller should drop the connection.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Bytes>> {
        self.buffer.extend_from_slice(data);

        let mut spans = Vec::new();

        while let Some(span) = self.try_extract_one()? {
            spans.push(span);
        }

        Ok(spans)
    }

    /// Try to extract a single frame span from the buffer.
    fn try_extract_one(&mut self) -> Result<Option<Bytes>> {
        match self.state {
            State::WaitingForSize => {
                if self.buffer.len() < SIZE_BYTES {
                    return Ok(None);
                }

                let mut prefix = [0u8; SIZE_BYTES];
                prefix.copy_from_slice(&self.buffer[..SIZE_BYTES]);
                let total_size = u32::from_be_bytes(prefix);

                if total_size > self.max_frame_size {
                    return Err(ClusterwireError::Protocol(format!(
                        "Frame size {} exceeds maximum {}",
                        total_size, self.max_frame_size
                    )));
                }

                self.state = State::WaitingForBody { total_size };
                self.try_extract_one()
            }

            State::WaitingForBody { total_size } => {
                let frame_len = SIZE_BYTES + total_size as usize;

                if self.buffer.len() < frame_len {
                    return Ok(None);
                }

                // Size prefix stays on the span (zero-copy freeze)
                let span = self.buffer.split_to(frame_len).freeze();
                self.state = State::WaitingForSize;

                Ok(Some(span))
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForSize;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForSize => "WaitingForSize",
            State::WaitingForBody { .. } => "WaitingForBody",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
