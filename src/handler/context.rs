//! Reply address of an inbound data request.

use crate::message::DataFrame;
use crate::protocol::NO_SEQUENCE;

/// Where a response to an inbound data request has to go.
///
/// Carries the route and sequence to echo plus the connection/user envelope, and nothing else,
/// so it can be handed to a [`Proxy`](super::Proxy) independently of the request it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub route: u8,
    pub seq: u64,
    pub cid: i64,
    pub uid: i64,
}

impl RequestContext {
    pub fn new(route: u8, seq: u64, cid: i64, uid: i64) -> Self {
        Self {
            route,
            seq,
            cid,
            uid,
        }
    }

    /// Whether the sender is waiting for a response.
    #[inline]
    pub fn expects_response(&self) -> bool {
        self.seq != NO_SEQUENCE
    }
}

impl From<&DataFrame> for RequestContext {
    fn from(frame: &DataFrame) -> Self {
        Self::new(frame.route, frame.seq, frame.cid, frame.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_expects_response() {
        assert!(RequestContext::new(20, 5, 1, 2).expects_response());
        assert!(!RequestContext::new(20, NO_SEQUENCE, 1, 2).expects_response());
    }

    #[test]
    fn test_from_data_frame() {
        let frame = DataFrame {
            route: 20,
            seq: 9,
            is_response: false,
            cid: 3,
            uid: 4,
            payload: Bytes::new(),
        };
        assert_eq!(RequestContext::from(&frame), RequestContext::new(20, 9, 3, 4));
    }
}
