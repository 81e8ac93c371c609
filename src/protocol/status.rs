//! Application status codes carried at the end of every response.

use std::fmt;

/// Peer-side outcome of a control operation.
///
/// A status is a result, not an error: the peer answered. Compare against the associated
/// constants; unknown codes are passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub i16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(0);
    pub const INTERNAL_ERROR: StatusCode = StatusCode(1);
    pub const NOT_FOUND_SESSION: StatusCode = StatusCode(2);
    pub const ILLEGAL_OPERATION: StatusCode = StatusCode(3);
    pub const INVALID_ARGUMENT: StatusCode = StatusCode(4);
    pub const UNSUPPORTED_ROUTE: StatusCode = StatusCode(5);

    #[inline]
    pub fn code(self) -> i16 {
        self.0
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }
}

impl From<i16> for StatusCode {
    fn from(code: i16) -> Self {
        StatusCode(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::OK => "ok",
            Self::INTERNAL_ERROR => "internal error",
            Self::NOT_FOUND_SESSION => "session not found",
            Self::ILLEGAL_OPERATION => "illegal operation",
            Self::INVALID_ARGUMENT => "invalid argument",
            Self::UNSUPPORTED_ROUTE => "unsupported route",
            _ => return write!(f, "status {}", self.0),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok() {
        assert!(StatusCode::OK.is_ok());
        assert!(!StatusCode::NOT_FOUND_SESSION.is_ok());
    }

    #[test]
    fn test_display_unknown_code() {
        assert_eq!(StatusCode(-7).to_string(), "status -7");
        assert_eq!(StatusCode::from(2).to_string(), "session not found");
    }
}
