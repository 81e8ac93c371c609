//! Error types for clusterwire.

use thiserror::Error;

/// Main error type for all clusterwire operations.
///
/// Framing errors (`InvalidMessage`, `UnknownRoute`, `UnmatchedSequence`) are local to one
/// decode attempt and never tear a connection down on their own. A non-OK
/// [`StatusCode`](crate::protocol::StatusCode) is a result, not an error, and never shows up here.
#[derive(Debug, Error)]
pub enum ClusterwireError {
    /// I/O error on the underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (configuration and pre-decoded payload values).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Span length or content does not match the operation's layout.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A sequential read ran past the end of the span.
    #[error("truncated read: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// A seek landed outside the span.
    #[error("seek to offset {offset} is outside a span of {len} bytes")]
    SeekOutOfRange { offset: i64, len: usize },

    /// Route byte has no entry in the route registry.
    #[error("unknown route: {0}")]
    UnknownRoute(u8),

    /// Response sequence has no pending request.
    #[error("unmatched sequence {seq} for route {route}")]
    UnmatchedSequence { seq: u64, route: u8 },

    /// No response arrived before the request deadline.
    #[error("request {seq} timed out")]
    Timeout { seq: u64 },

    /// The pending request was cancelled by its caller.
    #[error("request {seq} cancelled")]
    Cancelled { seq: u64 },

    /// Connection closed while the operation was in flight.
    #[error("Connection closed")]
    ConnectionClosed,

    /// No handler registered for a data route.
    #[error("Handler not found for route: {0}")]
    HandlerNotFound(u8),

    /// Protocol error (oversized frame, misuse of a request, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl ClusterwireError {
    /// Shorthand for a length mismatch on decode.
    pub(crate) fn length_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        Self::InvalidMessage(format!(
            "{what}: expected {expected} bytes, got {actual}"
        ))
    }
}

/// Result type alias using ClusterwireError.
pub type Result<T> = std::result::Result<T, ClusterwireError>;
