//! Connection builder and runtime loop.
//!
//! A [`Connection`] runs the protocol over one byte stream between a gate and a node:
//! 1. The stream is split; the write half goes to a dedicated writer task
//! 2. A read loop isolates frames in arrival order
//! 3. Responses are handed to the correlator, control requests to the [`ControlService`],
//!    data requests to the handler registered for their route
//! 4. When the read loop ends every pending call fails with `ConnectionClosed`
//!
//! Outbound calls go through a [`ConnectionHandle`], which can be cloned freely.
//!
//! # Example
//!
//! ```ignore
//! use clusterwire::{Connection, protocol::SessionKind};
//!
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:7301").await?;
//! let connection = Connection::builder()
//!     .peer_gate("gate-1")
//!     .handle(20, |req| async move { req.respond(&"pong").await })
//!     .start(stream);
//!
//! let code = connection
//!     .handle()
//!     .disconnect(SessionKind::User, 1001, true)
//!     .await?;
//! ```

use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::correlator::Correlator;
use crate::error::{ClusterwireError, Result};
use crate::handler::{
    ConnectionProxy, ControlService, HandlerRegistry, HandlerResult, Payload, Proxy, Request,
    RequestContext,
};
use crate::message::{
    data_total_size, decode_data, encode_data, ControlReply, ControlRequest, DataFrame,
};
use crate::protocol::{
    Frame, FrameBuffer, Route, SessionKind, StatusCode, DEFAULT_MAX_FRAME_SIZE, NO_SEQUENCE,
};
use crate::writer::{
    spawn_writer_task, OutboundFrame, WriterConfig, WriterHandle, DEFAULT_CHANNEL_CAPACITY,
};

/// Default deadline for a call awaiting its response.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3000;

/// Default maximum concurrent handlers.
pub const DEFAULT_MAX_CONCURRENT_HANDLERS: usize = 256;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Tunables for one connection.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use clusterwire::ConnectionConfig;
///
/// let config = ConnectionConfig::from_json(r#"{ "request_timeout_ms": 500 }"#).unwrap();
/// assert_eq!(config.request_timeout_ms, 500);
/// assert_eq!(config.max_concurrent_handlers, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Deadline for calls awaiting a response.
    pub request_timeout_ms: u64,
    /// Largest accepted `total_size`.
    pub max_frame_size: u32,
    /// Inbound handlers allowed to run at once; excess requests are dropped.
    pub max_concurrent_handlers: usize,
    /// Outbound frame queue length.
    pub channel_capacity: usize,
    /// Send a heartbeat this often. Disabled when absent or 0.
    pub heartbeat_interval_ms: Option<u64>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_concurrent_handlers: DEFAULT_MAX_CONCURRENT_HANDLERS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            heartbeat_interval_ms: None,
        }
    }
}

impl ConnectionConfig {
    /// Load a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Builder for configuring and starting a [`Connection`].
pub struct ConnectionBuilder {
    registry: HandlerRegistry,
    control: Option<Arc<dyn ControlService>>,
    peer_gate: Option<Arc<str>>,
    peer_node: Option<Arc<str>>,
    config: ConnectionConfig,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            control: None,
            peer_gate: None,
            peer_node: None,
            config: ConnectionConfig::default(),
        }
    }

    /// Register a handler for a data route.
    pub fn handle<F, Fut>(mut self, route: u8, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.register(route, handler);
        self
    }

    /// Register a handler for a data route that receives the decoded payload.
    pub fn handle_typed<F, T, Fut>(mut self, route: u8, handler: F) -> Self
    where
        F: Fn(T, Request) -> Fut + Send + Sync + 'static,
        T: serde::de::DeserializeOwned + Send + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.register_typed(route, handler);
        self
    }

    /// Answer inbound control requests with `service`.
    ///
    /// Without a service only heartbeats are answered `OK`; every other control request gets
    /// `UNSUPPORTED_ROUTE`.
    pub fn control_service<S: ControlService>(mut self, service: S) -> Self {
        self.control = Some(Arc::new(service));
        self
    }

    /// The peer is the gate with this id. Inbound requests carry it as their `gid`.
    pub fn peer_gate(mut self, gid: impl Into<String>) -> Self {
        self.peer_gate = Some(Arc::from(gid.into()));
        self
    }

    /// The peer is the node with this id. Inbound requests carry it as their `nid`.
    pub fn peer_node(mut self, nid: impl Into<String>) -> Self {
        self.peer_node = Some(Arc::from(nid.into()));
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn max_frame_size(mut self, size: u32) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Set the maximum number of concurrent handlers.
    ///
    /// When this limit is reached, new requests will be dropped with a warning.
    /// Default: 256
    pub fn max_concurrent_handlers(mut self, limit: usize) -> Self {
        self.config.max_concurrent_handlers = limit;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    /// Start the runtime over `io`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<S>(self, io: S) -> Connection
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Connection::start(self, io)
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Shared {
    writer: WriterHandle,
    correlator: Arc<Correlator>,
    request_timeout: Duration,
    max_frame_size: u32,
    peer_gate: Option<Arc<str>>,
    peer_node: Option<Arc<str>>,
    shutdown: watch::Sender<bool>,
}

/// Cloneable handle for outbound calls on a running connection.
#[derive(Clone)]
pub struct ConnectionHandle {
    shared: Arc<Shared>,
}

impl ConnectionHandle {
    pub fn peer_gate(&self) -> Option<&str> {
        self.shared.peer_gate.as_deref()
    }

    pub fn peer_node(&self) -> Option<&str> {
        self.shared.peer_node.as_deref()
    }

    /// Whether the connection has stopped; every call fails with `ConnectionClosed` then.
    pub fn is_closed(&self) -> bool {
        self.shared.correlator.is_closed()
    }

    /// Calls currently waiting for a response.
    pub fn pending_calls(&self) -> usize {
        self.shared.correlator.len()
    }

    /// Stop the read loop. Pending calls fail with `ConnectionClosed`.
    pub fn close(&self) {
        self.shared.shutdown.send_replace(true);
    }

    /// Issue a control request and wait for its reply.
    ///
    /// Dropping the returned future before it resolves cancels the call; its sequence is
    /// released and a late reply is discarded.
    pub async fn call(&self, request: ControlRequest) -> Result<ControlReply> {
        let route = request.route();
        let frame = self
            .exchange(true, route.code(), |seq| {
                Ok(OutboundFrame::control(request.encode(seq)))
            })
            .await?;
        ControlReply::decode(route, frame.as_bytes())
    }

    pub async fn heartbeat(&self) -> Result<StatusCode> {
        Ok(self.call(ControlRequest::Heartbeat).await?.code())
    }

    /// Ask the gate to bind user `uid` to its connection `cid`.
    pub async fn bind_gate(&self, cid: i64, uid: i64) -> Result<StatusCode> {
        Ok(self.call(ControlRequest::BindGate { cid, uid }).await?.code())
    }

    pub async fn unbind_gate(&self, uid: i64) -> Result<StatusCode> {
        Ok(self.call(ControlRequest::UnbindGate { uid }).await?.code())
    }

    pub async fn bind_node(&self, uid: i64) -> Result<StatusCode> {
        Ok(self.call(ControlRequest::BindNode { uid }).await?.code())
    }

    pub async fn unbind_node(&self, uid: i64) -> Result<StatusCode> {
        Ok(self.call(ControlRequest::UnbindNode { uid }).await?.code())
    }

    /// Close the session `target` of `kind` on the peer, immediately when `is_force`.
    pub async fn disconnect(
        &self,
        kind: SessionKind,
        target: i64,
        is_force: bool,
    ) -> Result<StatusCode> {
        let request = ControlRequest::Disconnect {
            kind,
            target,
            is_force,
        };
        Ok(self.call(request).await?.code())
    }

    /// Count the peer's sessions of `kind`.
    pub async fn stat(&self, kind: SessionKind) -> Result<(u64, StatusCode)> {
        match self.call(ControlRequest::Stat { kind }).await? {
            ControlReply::Stat { total, code } => Ok((total, code)),
            other => Err(unexpected_reply(Route::Stat, other)),
        }
    }

    /// Look up the remote address of a session on the peer.
    pub async fn get_ip(&self, kind: SessionKind, target: i64) -> Result<(IpAddr, StatusCode)> {
        match self.call(ControlRequest::GetIp { kind, target }).await? {
            ControlReply::Ip { ip, code } => Ok((ip, code)),
            other => Err(unexpected_reply(Route::GetIp, other)),
        }
    }

    /// Send a data request and wait for the data response.
    pub async fn request(&self, route: u8, cid: i64, uid: i64, payload: Bytes) -> Result<DataFrame> {
        check_data_route(route)?;
        self.check_payload_size(payload.len())?;
        let frame = self
            .exchange(false, route, |seq| {
                encode_data(false, route, seq, cid, uid, payload)
            })
            .await?;
        decode_data(&frame)
    }

    /// Send a data frame that expects no response.
    pub async fn push(&self, route: u8, cid: i64, uid: i64, payload: Bytes) -> Result<()> {
        check_data_route(route)?;
        self.check_payload_size(payload.len())?;
        self.send(encode_data(false, route, NO_SEQUENCE, cid, uid, payload)?)
            .await
    }

    /// Answer the data request identified by `ctx`.
    pub async fn respond(&self, ctx: RequestContext, payload: Bytes) -> Result<()> {
        self.check_payload_size(payload.len())?;
        self.send(encode_data(true, ctx.route, ctx.seq, ctx.cid, ctx.uid, payload)?)
            .await
    }

    /// Frames above the size limit would end the peer's read loop, so they never leave.
    fn check_payload_size(&self, payload_len: usize) -> Result<()> {
        let total_size = data_total_size(payload_len);
        if total_size > self.shared.max_frame_size as usize {
            return Err(ClusterwireError::Protocol(format!(
                "data frame of {} bytes exceeds max frame size {}",
                total_size, self.shared.max_frame_size
            )));
        }
        Ok(())
    }

    async fn send(&self, frame: OutboundFrame) -> Result<()> {
        if self.is_closed() {
            return Err(ClusterwireError::ConnectionClosed);
        }
        self.shared.writer.send(frame).await
    }

    async fn exchange(
        &self,
        control: bool,
        route: u8,
        build: impl FnOnce(u64) -> Result<OutboundFrame>,
    ) -> Result<Frame> {
        let call = self
            .shared
            .correlator
            .register(control, route, self.shared.request_timeout)?;
        let seq = call.seq();

        // On failure `call` is dropped here, which removes its entry.
        self.shared.writer.send(build(seq)?).await?;
        trace!(seq, route, control, "Request sent");

        call.wait().await
    }
}

fn unexpected_reply(route: Route, reply: ControlReply) -> ClusterwireError {
    ClusterwireError::Protocol(format!("unexpected reply {reply:?} for {route}"))
}

fn check_data_route(route: u8) -> Result<()> {
    if route == 0 {
        return Err(ClusterwireError::Protocol(
            "route 0 is reserved".to_string(),
        ));
    }
    Ok(())
}

/// A running connection.
///
/// Use [`handle`](Connection::handle) for outbound calls and
/// [`wait_for_shutdown`](Connection::wait_for_shutdown) to block until the stream ends.
pub struct Connection {
    handle: ConnectionHandle,
    read_task: JoinHandle<Result<()>>,
}

impl Connection {
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    fn start<S>(builder: ConnectionBuilder, io: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let ConnectionBuilder {
            registry,
            control,
            peer_gate,
            peer_node,
            config,
        } = builder;

        let (read_half, write_half) = tokio::io::split(io);

        let (writer, writer_task) = spawn_writer_task(
            write_half,
            WriterConfig {
                channel_capacity: config.channel_capacity,
            },
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = ConnectionHandle {
            shared: Arc::new(Shared {
                writer,
                correlator: Arc::new(Correlator::new()),
                request_timeout: config.request_timeout(),
                max_frame_size: config.max_frame_size,
                peer_gate,
                peer_node,
                shutdown: shutdown_tx,
            }),
        };

        if let Some(interval) = config.heartbeat_interval() {
            tokio::spawn(heartbeat_loop(handle.clone(), interval, shutdown_rx.clone()));
        }

        let dispatcher = Dispatcher {
            proxy: ConnectionProxy::new(handle.clone()).into_arc(),
            handle: handle.clone(),
            registry: Arc::new(registry),
            control,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_handlers)),
        };

        let max_frame_size = config.max_frame_size;
        let read_task = tokio::spawn(async move {
            let mut writer_task = writer_task;

            // A failed write ends the connection just like a failed read.
            let result = tokio::select! {
                result = read_loop(read_half, &dispatcher, max_frame_size, shutdown_rx) => {
                    match &result {
                        Ok(()) => debug!("Read loop finished"),
                        Err(e) => error!("Read loop error: {}", e),
                    }
                    result
                }
                joined = &mut writer_task => {
                    let result = match joined {
                        Ok(result) => result,
                        Err(e) => Err(ClusterwireError::Protocol(format!(
                            "writer task failed: {e}"
                        ))),
                    };
                    match &result {
                        Ok(()) => debug!("Writer finished"),
                        Err(e) => error!("Writer error: {}", e),
                    }
                    result
                }
            };

            let failed = dispatcher.handle.shared.correlator.close();
            dispatcher.handle.close();
            writer_task.abort();
            debug!(failed, "Connection closed");

            result
        });

        Connection { handle, read_task }
    }

    /// Handle for outbound calls.
    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    /// Stop the connection.
    pub fn close(&self) {
        self.handle.close();
    }

    /// Wait until the read loop ends (peer closed, stream error or [`close`](Self::close)).
    pub async fn wait_for_shutdown(self) -> Result<()> {
        self.read_task
            .await
            .map_err(|e| ClusterwireError::Protocol(format!("read loop task failed: {e}")))?
    }
}

/// Reads frames in arrival order until EOF, a stream error or shutdown.
async fn read_loop<R>(
    mut reader: R,
    dispatcher: &Dispatcher,
    max_frame_size: u32,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut frame_buffer = FrameBuffer::with_max_frame_size(max_frame_size);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            read = reader.read(&mut buf) => match read? {
                0 => return Ok(()),
                n => n,
            },
        };

        // An oversized frame cannot be skipped, so it ends the connection.
        for span in frame_buffer.push(&buf[..n])? {
            dispatcher.dispatch(span);
        }
    }
}

async fn heartbeat_loop(
    handle: ConnectionHandle,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        match handle.heartbeat().await {
            Ok(code) if code.is_ok() => trace!("Heartbeat acknowledged"),
            Ok(code) => warn!(%code, "Heartbeat answered with non-OK status"),
            Err(ClusterwireError::ConnectionClosed) => break,
            Err(e) => warn!(error = %e, "Heartbeat failed"),
        }
    }
}

/// Routes inbound frames. Owned by the read loop.
struct Dispatcher {
    handle: ConnectionHandle,
    proxy: Arc<dyn Proxy>,
    registry: Arc<HandlerRegistry>,
    control: Option<Arc<dyn ControlService>>,
    semaphore: Arc<Semaphore>,
}

impl Dispatcher {
    /// Never suspends; everything that has to wait for the writer runs in its own task.
    fn dispatch(&self, span: Bytes) {
        let frame = match Frame::parse(span) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Dropping invalid frame");
                return;
            }
        };

        if frame.is_response() {
            if let Err(e) = self.handle.shared.correlator.complete(frame) {
                // Late responses to timed out or cancelled calls end up here
                debug!(error = %e, "Dropping response");
            }
        } else if frame.is_control() {
            self.dispatch_control(frame);
        } else {
            self.dispatch_data(frame);
        }
    }

    fn dispatch_control(&self, frame: Frame) {
        let (seq, request) = match ControlRequest::decode(frame.as_bytes()) {
            Ok(decoded) => decoded,
            Err(ClusterwireError::UnknownRoute(route)) => {
                warn!(route, seq = frame.seq(), "Dropping control request for unknown route");
                return;
            }
            Err(e) => {
                warn!(error = %e, seq = frame.seq(), "Dropping invalid control request");
                return;
            }
        };
        let route = request.route();
        trace!(%route, seq, "Control request");

        let service = match (&self.control, request) {
            (_, ControlRequest::Heartbeat) => {
                self.reply(route, seq, ControlReply::Status(StatusCode::OK));
                return;
            }
            (None, _) => {
                let reply = ControlReply::status_for(route, StatusCode::UNSUPPORTED_ROUTE);
                self.reply(route, seq, reply);
                return;
            }
            (Some(service), _) => service.clone(),
        };

        let permit = match self.semaphore.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                warn!(%route, seq, "Handler capacity reached, dropping control request");
                return;
            }
        };

        let handle = self.handle.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let reply = service.handle(request).await;
            send_reply(&handle, route, seq, reply).await;
        });
    }

    fn reply(&self, route: Route, seq: u64, reply: ControlReply) {
        let handle = self.handle.clone();
        tokio::spawn(async move { send_reply(&handle, route, seq, reply).await });
    }

    fn dispatch_data(&self, frame: Frame) {
        let data = match decode_data(&frame) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, seq = frame.seq(), "Dropping invalid data frame");
                return;
            }
        };

        if !self.registry.contains(data.route) {
            warn!(route = data.route, seq = data.seq, "No handler for data route");
            return;
        }

        let permit = match self.semaphore.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                warn!(
                    "Handler capacity reached, dropping request {} for route {}",
                    data.seq, data.route
                );
                return;
            }
        };

        let ctx = RequestContext::from(&data);
        let request = Request::new(ctx, Payload::Raw(data.payload), self.proxy.clone())
            .with_gid(self.handle.shared.peer_gate.clone())
            .with_nid(self.handle.shared.peer_node.clone());

        let registry = self.registry.clone();
        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = registry.dispatch(request).await {
                error!("Handler error for route {}: {}", ctx.route, e);
            }
        });
    }
}

async fn send_reply(handle: &ConnectionHandle, route: Route, seq: u64, reply: ControlReply) {
    let bytes = match reply.encode(route, seq) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(%route, seq, error = %e, "Control service returned a mismatched reply");
            match ControlReply::status_for(route, StatusCode::INTERNAL_ERROR).encode(route, seq) {
                Ok(bytes) => bytes,
                Err(_) => return,
            }
        }
    };

    if let Err(e) = handle.send(OutboundFrame::control(bytes)).await {
        debug!(%route, seq, error = %e, "Could not send control reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
        assert_eq!(config.max_concurrent_handlers, 256);
        assert_eq!(config.channel_capacity, 1024);
        assert_eq!(config.heartbeat_interval(), None);
    }

    #[test]
    fn test_config_from_json() {
        let config = ConnectionConfig::from_json(
            r#"{ "max_frame_size": 4096, "heartbeat_interval_ms": 1500 }"#,
        )
        .unwrap();

        assert_eq!(config.max_frame_size, 4096);
        assert_eq!(config.heartbeat_interval(), Some(Duration::from_millis(1500)));
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn test_config_zero_heartbeat_disabled() {
        let config = ConnectionConfig::from_json(r#"{ "heartbeat_interval_ms": 0 }"#).unwrap();
        assert_eq!(config.heartbeat_interval(), None);
    }

    #[test]
    fn test_config_rejects_bad_json() {
        assert!(matches!(
            ConnectionConfig::from_json(r#"{ "max_frame_size": "big" }"#),
            Err(ClusterwireError::Json(_))
        ));
    }

    #[test]
    fn test_builder_configuration() {
        let builder = Connection::builder()
            .request_timeout(Duration::from_millis(250))
            .max_frame_size(1024)
            .max_concurrent_handlers(8)
            .channel_capacity(16)
            .heartbeat_interval(Duration::from_secs(10))
            .peer_gate("gate-1");

        assert_eq!(builder.config.request_timeout_ms, 250);
        assert_eq!(builder.config.max_frame_size, 1024);
        assert_eq!(builder.config.max_concurrent_handlers, 8);
        assert_eq!(builder.config.channel_capacity, 16);
        assert_eq!(builder.config.heartbeat_interval_ms, Some(10_000));
        assert_eq!(builder.peer_gate.as_deref(), Some("gate-1"));
    }

    #[test]
    fn test_builder_registers_routes() {
        let builder = Connection::builder()
            .handle(20, |_req| async { Ok(()) })
            .handle_typed(21, |_n: u32, _req| async { Ok(()) });

        assert_eq!(builder.registry.routes(), vec![20, 21]);
    }

    #[tokio::test]
    async fn test_close_fails_calls() {
        let (a, _b) = tokio::io::duplex(1024);
        let connection = Connection::builder().start(a);
        let handle = connection.handle();

        connection.close();
        connection.wait_for_shutdown().await.unwrap();

        assert!(handle.is_closed());
        assert!(matches!(
            handle.heartbeat().await,
            Err(ClusterwireError::ConnectionClosed)
        ));
        assert!(matches!(
            handle.push(20, 1, 2, Bytes::new()).await,
            Err(ClusterwireError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_route_zero_rejected_on_send() {
        let (a, _b) = tokio::io::duplex(1024);
        let connection = Connection::builder().start(a);

        let err = connection
            .handle()
            .push(0, 1, 2, Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterwireError::Protocol(_)));
    }
}
