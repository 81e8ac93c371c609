//! Disconnect - a node asks its gate to drop a client session.
//!
//! This demo runs both ends in one process over TCP:
//! - the gate keeps a small session table and answers control requests
//! - the node forces one known session off, then tries an unknown one
//!
//! ```text
//! RUST_LOG=clusterwire=debug cargo run --example disconnect
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use clusterwire::message::{ControlReply, ControlRequest};
use clusterwire::protocol::{SessionKind, StatusCode};
use clusterwire::Connection;
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Accept one node and answer its control requests from the session table.
async fn run_gate(listener: TcpListener, sessions: Arc<Mutex<HashSet<i64>>>) -> clusterwire::Result<()> {
    let (stream, peer) = listener.accept().await?;
    info!(%peer, "node connected");

    let connection = Connection::builder()
        .peer_node("node-1")
        .control_service(move |request: ControlRequest| {
            let sessions = sessions.clone();
            async move {
                match request {
                    ControlRequest::Disconnect {
                        kind: SessionKind::Conn,
                        target,
                        is_force,
                    } => {
                        if sessions.lock().remove(&target) {
                            info!(target, is_force, "session dropped");
                            ControlReply::Status(StatusCode::OK)
                        } else {
                            ControlReply::Status(StatusCode::NOT_FOUND_SESSION)
                        }
                    }
                    ControlRequest::Disconnect { .. } => {
                        ControlReply::Status(StatusCode::ILLEGAL_OPERATION)
                    }
                    ControlRequest::Stat { .. } => ControlReply::Stat {
                        total: sessions.lock().len() as u64,
                        code: StatusCode::OK,
                    },
                    other => ControlReply::status_for(other.route(), StatusCode::OK),
                }
            }
        })
        .start(stream);

    connection.wait_for_shutdown().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let sessions: Arc<Mutex<HashSet<i64>>> = Arc::new(Mutex::new([1001, 1002].into()));

    let gate = tokio::spawn(run_gate(listener, sessions));

    let stream = TcpStream::connect(addr).await?;
    let node = Connection::builder().peer_gate("gate-1").start(stream);
    let handle = node.handle();

    let code = handle.disconnect(SessionKind::Conn, 1001, true).await?;
    info!(%code, "disconnect 1001");

    let code = handle.disconnect(SessionKind::Conn, 9999, true).await?;
    info!(%code, "disconnect 9999");

    let (total, code) = handle.stat(SessionKind::Conn).await?;
    info!(total, %code, "sessions left on gate");

    node.close();
    node.wait_for_shutdown().await?;
    gate.await??;

    Ok(())
}
