//! Session kind tag carried by disconnect, stat and IP lookup requests.

use std::fmt;

use crate::error::ClusterwireError;

/// Namespace a target identifier belongs to.
///
/// The protocol only carries the tag; resolving `(kind, target)` to an actual session is up
/// to the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionKind {
    /// Target is a connection id.
    Conn = 1,
    /// Target is a user id.
    User = 2,
    /// Target is a gateway id.
    Gate = 3,
    /// Target is a node id.
    Node = 4,
}

impl SessionKind {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SessionKind {
    type Error = ClusterwireError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(SessionKind::Conn),
            2 => Ok(SessionKind::User),
            3 => Ok(SessionKind::Gate),
            4 => Ok(SessionKind::Node),
            other => Err(ClusterwireError::InvalidMessage(format!(
                "unknown session kind {other}"
            ))),
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionKind::Conn => "conn",
            SessionKind::User => "user",
            SessionKind::Gate => "gate",
            SessionKind::Node => "node",
        };
        f.write_str(name)
    }
}
