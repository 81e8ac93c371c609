//! Request façade handed to data-route handlers.
//!
//! A [`Request`] is built once per inbound data frame. It exposes what the frame carried
//! (route, sequence, connection and user ids, payload) plus the identity of the peer process,
//! and turns its outbound actions into calls on the [`Proxy`] it was constructed with.
//!
//! # Example
//!
//! ```ignore
//! async fn enter_room(req: Request) -> Result<()> {
//!     let room: String = req.parse()?;
//!     req.bind_node().await?;
//!     req.respond(&format!("joined {room}")).await
//! }
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Proxy, RequestContext};
use crate::codec::MsgPackCodec;
use crate::error::{ClusterwireError, Result};
use crate::protocol::StatusCode;

/// Payload of a request: raw bytes decoded on demand, or an already decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// MessagePack bytes as received.
    Raw(Bytes),
    /// Value produced by an earlier decoding stage.
    Value(serde_json::Value),
}

impl Payload {
    /// Decode the payload into `T`, whichever form it is in.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Payload::Raw(bytes) => MsgPackCodec::decode(bytes),
            Payload::Value(value) => Ok(T::deserialize(value)?),
        }
    }

    /// The raw bytes, if the payload has not been decoded.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Payload::Raw(bytes) => Some(bytes),
            Payload::Value(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Raw(bytes) => bytes.is_empty(),
            Payload::Value(value) => value.is_null(),
        }
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Raw(bytes)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Value(value)
    }
}

/// One inbound data request.
#[derive(Clone)]
pub struct Request {
    ctx: RequestContext,
    gid: Option<Arc<str>>,
    nid: Option<Arc<str>>,
    payload: Payload,
    proxy: Arc<dyn Proxy>,
}

impl Request {
    /// Build a request around its reply address, payload and the proxy used for actions.
    pub fn new(ctx: RequestContext, payload: impl Into<Payload>, proxy: Arc<dyn Proxy>) -> Self {
        Self {
            ctx,
            gid: None,
            nid: None,
            payload: payload.into(),
            proxy,
        }
    }

    /// Record the gate the request was routed through.
    pub fn with_gid(mut self, gid: Option<Arc<str>>) -> Self {
        self.gid = gid;
        self
    }

    /// Record the node the request came from.
    pub fn with_nid(mut self, nid: Option<Arc<str>>) -> Self {
        self.nid = nid;
        self
    }

    /// Gate id, `None` when the request did not come through a gate.
    pub fn gid(&self) -> Option<&str> {
        self.gid.as_deref()
    }

    /// Node id, `None` when the request did not come from a node.
    pub fn nid(&self) -> Option<&str> {
        self.nid.as_deref()
    }

    pub fn cid(&self) -> i64 {
        self.ctx.cid
    }

    pub fn uid(&self) -> i64 {
        self.ctx.uid
    }

    pub fn route(&self) -> u8 {
        self.ctx.route
    }

    pub fn seq(&self) -> u64 {
        self.ctx.seq
    }

    pub fn context(&self) -> RequestContext {
        self.ctx
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Decode the payload into `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        self.payload.parse()
    }

    /// Respond with a MessagePack-encoded value.
    pub async fn respond<T: Serialize>(&self, value: &T) -> Result<()> {
        let payload = MsgPackCodec::encode_bytes(value)?;
        self.respond_raw(payload).await
    }

    /// Respond with pre-encoded bytes.
    ///
    /// Fails for fire-and-forget requests, which have no sequence to answer.
    pub async fn respond_raw(&self, payload: Bytes) -> Result<()> {
        if !self.ctx.expects_response() {
            return Err(ClusterwireError::Protocol(format!(
                "request on route {} expects no response",
                self.ctx.route
            )));
        }
        self.proxy.respond(self.ctx, payload).await
    }

    /// Bind `uid` to this request's gate connection.
    pub async fn bind_gate(&self, uid: i64) -> Result<StatusCode> {
        let gid = self.gid.as_deref().ok_or_else(|| {
            ClusterwireError::Protocol(
                "illegal operation: request did not arrive through a gate".to_string(),
            )
        })?;
        self.proxy.bind_gate(gid, self.ctx.cid, uid).await
    }

    /// Unbind this request's user from its gate.
    pub async fn unbind_gate(&self) -> Result<StatusCode> {
        self.proxy.unbind_gate(self.ctx.uid).await
    }

    /// Bind this request's user to the node.
    pub async fn bind_node(&self) -> Result<StatusCode> {
        self.proxy.bind_node(self.ctx.uid).await
    }

    /// Unbind this request's user from the node.
    pub async fn unbind_node(&self) -> Result<StatusCode> {
        self.proxy.unbind_node(self.ctx.uid).await
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("ctx", &self.ctx)
            .field("gid", &self.gid)
            .field("nid", &self.nid)
            .field("payload", &self.payload)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::BoxFuture;
    use parking_lot::Mutex;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Respond(RequestContext, Bytes),
        BindGate(String, i64, i64),
        UnbindGate(i64),
        BindNode(i64),
        UnbindNode(i64),
    }

    #[derive(Default)]
    struct RecordingProxy {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingProxy {
        fn record(&self, call: Call) -> BoxFuture<'static, Result<StatusCode>> {
            self.calls.lock().push(call);
            Box::pin(async { Ok(StatusCode::OK) })
        }
    }

    impl Proxy for RecordingProxy {
        fn respond(&self, ctx: RequestContext, payload: Bytes) -> BoxFuture<'static, Result<()>> {
            self.calls.lock().push(Call::Respond(ctx, payload));
            Box::pin(async { Ok(()) })
        }

        fn bind_gate(&self, gid: &str, cid: i64, uid: i64) -> BoxFuture<'static, Result<StatusCode>> {
            self.record(Call::BindGate(gid.to_string(), cid, uid))
        }

        fn unbind_gate(&self, uid: i64) -> BoxFuture<'static, Result<StatusCode>> {
            self.record(Call::UnbindGate(uid))
        }

        fn bind_node(&self, uid: i64) -> BoxFuture<'static, Result<StatusCode>> {
            self.record(Call::BindNode(uid))
        }

        fn unbind_node(&self, uid: i64) -> BoxFuture<'static, Result<StatusCode>> {
            self.record(Call::UnbindNode(uid))
        }
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Move {
        x: i32,
        y: i32,
    }

    fn request(seq: u64, payload: Payload) -> (Request, Arc<RecordingProxy>) {
        let proxy = Arc::new(RecordingProxy::default());
        let req = Request::new(RequestContext::new(20, seq, 7, 42), payload, proxy.clone())
            .with_gid(Some(Arc::from("gate-1")));
        (req, proxy)
    }

    #[test]
    fn test_accessors() {
        let (req, _) = request(3, Payload::Raw(Bytes::new()));

        assert_eq!(req.gid(), Some("gate-1"));
        assert_eq!(req.nid(), None);
        assert_eq!((req.cid(), req.uid(), req.route(), req.seq()), (7, 42, 20, 3));
        assert!(req.payload().is_empty());
    }

    #[test]
    fn test_parse_raw_and_value_payloads() {
        let raw = MsgPackCodec::encode_bytes(&Move { x: 1, y: -2 }).unwrap();
        let (req, _) = request(1, Payload::Raw(raw));
        assert_eq!(req.parse::<Move>().unwrap(), Move { x: 1, y: -2 });

        let (req, _) = request(1, Payload::Value(serde_json::json!({"x": 1, "y": -2})));
        assert_eq!(req.parse::<Move>().unwrap(), Move { x: 1, y: -2 });
        assert!(req.payload().as_bytes().is_none());
    }

    #[tokio::test]
    async fn test_respond_goes_through_proxy() {
        let (req, proxy) = request(3, Payload::Raw(Bytes::new()));

        req.respond(&"ok").await.unwrap();

        let calls = proxy.calls.lock().clone();
        let expected = MsgPackCodec::encode_bytes(&"ok").unwrap();
        assert_eq!(calls, vec![Call::Respond(req.context(), expected)]);
    }

    #[tokio::test]
    async fn test_respond_to_fire_and_forget_fails() {
        let (req, proxy) = request(0, Payload::Raw(Bytes::new()));

        let err = req.respond_raw(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, ClusterwireError::Protocol(_)));
        assert!(proxy.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_bind_actions_marshal_ids() {
        let (req, proxy) = request(3, Payload::Raw(Bytes::new()));

        assert_eq!(req.bind_gate(99).await.unwrap(), StatusCode::OK);
        req.unbind_gate().await.unwrap();
        req.bind_node().await.unwrap();
        req.unbind_node().await.unwrap();

        assert_eq!(
            proxy.calls.lock().clone(),
            vec![
                Call::BindGate("gate-1".to_string(), 7, 99),
                Call::UnbindGate(42),
                Call::BindNode(42),
                Call::UnbindNode(42),
            ]
        );
    }

    #[tokio::test]
    async fn test_bind_gate_without_gate_is_illegal() {
        let proxy = Arc::new(RecordingProxy::default());
        let req = Request::new(RequestContext::new(20, 1, 7, 42), Bytes::new(), proxy.clone());

        assert!(req.bind_gate(1).await.is_err());
        assert!(proxy.calls.lock().is_empty());
    }
}
