//! # clusterwire
//!
//! Binary control-frame protocol spoken between the gate and node processes of a real-time
//! messaging cluster.
//!
//! Gates terminate client connections, nodes host application logic. Over one byte stream
//! they exchange:
//!
//! - **Control frames** - fixed-layout administrative operations (heartbeat, bind/unbind a
//!   user to a gate or node, disconnect a session, session stats, remote address lookup)
//! - **Data frames** - opaque application payloads tagged with a route, connection id and
//!   user id
//!
//! Every frame is length prefixed and carries a sequence number that the response echoes, so
//! any number of calls can be in flight on one connection.
//!
//! ## Layers
//!
//! - [`protocol`] - frame layout, cursor codec, stream re-assembly
//! - [`message`] - encode/decode functions for every operation
//! - [`correlator`] - sequence allocation and response matching
//! - [`handler`] - request façade, proxy and handler registry
//! - [`Connection`] - runtime that drives all of the above over an `AsyncRead + AsyncWrite`
//!
//! ## Example
//!
//! ```ignore
//! use clusterwire::{Connection, message::{ControlReply, ControlRequest}, protocol::StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> clusterwire::Result<()> {
//!     let stream = tokio::net::TcpStream::connect("127.0.0.1:7301").await?;
//!
//!     let connection = Connection::builder()
//!         .peer_node("node-1")
//!         .control_service(|request: ControlRequest| async move {
//!             ControlReply::status_for(request.route(), StatusCode::OK)
//!         })
//!         .start(stream);
//!
//!     connection.wait_for_shutdown().await
//! }
//! ```

pub mod codec;
pub mod correlator;
pub mod error;
pub mod handler;
pub mod message;
pub mod protocol;
pub mod writer;

mod connection;

pub use connection::{
    Connection, ConnectionBuilder, ConnectionConfig, ConnectionHandle,
    DEFAULT_MAX_CONCURRENT_HANDLERS, DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use error::{ClusterwireError, Result};
pub use handler::{Request, RequestContext};
