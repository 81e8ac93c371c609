//! Outbound side of the request façade.

use std::sync::Arc;

use bytes::Bytes;

use super::{BoxFuture, RequestContext};
use crate::connection::ConnectionHandle;
use crate::error::{ClusterwireError, Result};
use crate::protocol::StatusCode;

/// Performs the cross-process effect of a [`Request`](super::Request) action.
///
/// Every method returns an owned future so implementations can hand the work off to another
/// task. A non-OK [`StatusCode`] is the peer's answer, not an error.
pub trait Proxy: Send + Sync + 'static {
    /// Send a response to the request identified by `ctx`.
    fn respond(&self, ctx: RequestContext, payload: Bytes) -> BoxFuture<'static, Result<()>>;

    /// Bind user `uid` to connection `cid` on gate `gid`.
    fn bind_gate(&self, gid: &str, cid: i64, uid: i64) -> BoxFuture<'static, Result<StatusCode>>;

    fn unbind_gate(&self, uid: i64) -> BoxFuture<'static, Result<StatusCode>>;

    fn bind_node(&self, uid: i64) -> BoxFuture<'static, Result<StatusCode>>;

    fn unbind_node(&self, uid: i64) -> BoxFuture<'static, Result<StatusCode>>;
}

/// [`Proxy`] that performs every action over one connection.
///
/// Responses become data frames, bind/unbind become control calls through the connection's
/// correlator.
#[derive(Clone)]
pub struct ConnectionProxy {
    handle: ConnectionHandle,
}

impl ConnectionProxy {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self { handle }
    }

    pub fn into_arc(self) -> Arc<dyn Proxy> {
        Arc::new(self)
    }
}

impl Proxy for ConnectionProxy {
    fn respond(&self, ctx: RequestContext, payload: Bytes) -> BoxFuture<'static, Result<()>> {
        let handle = self.handle.clone();
        Box::pin(async move { handle.respond(ctx, payload).await })
    }

    fn bind_gate(&self, gid: &str, cid: i64, uid: i64) -> BoxFuture<'static, Result<StatusCode>> {
        let handle = self.handle.clone();
        if handle.peer_gate() != Some(gid) {
            let err = ClusterwireError::Protocol(format!("no link to gate {gid}"));
            return Box::pin(async move { Err(err) });
        }
        Box::pin(async move { handle.bind_gate(cid, uid).await })
    }

    fn unbind_gate(&self, uid: i64) -> BoxFuture<'static, Result<StatusCode>> {
        let handle = self.handle.clone();
        Box::pin(async move { handle.unbind_gate(uid).await })
    }

    fn bind_node(&self, uid: i64) -> BoxFuture<'static, Result<StatusCode>> {
        let handle = self.handle.clone();
        Box::pin(async move { handle.bind_node(uid).await })
    }

    fn unbind_node(&self, uid: i64) -> BoxFuture<'static, Result<StatusCode>> {
        let handle = self.handle.clone();
        Box::pin(async move { handle.unbind_node(uid).await })
    }
}
