//! Receiving side of control operations.

use std::future::Future;

use super::BoxFuture;
use crate::message::{ControlReply, ControlRequest};

/// Decides the outcome of inbound control requests.
///
/// The runtime decodes the request, calls [`handle`](ControlService::handle) and encodes the
/// returned reply with the request's sequence. What a bind or disconnect actually does is up
/// to the implementation.
///
/// Any `Fn(ControlRequest) -> impl Future<Output = ControlReply>` closure is a service.
pub trait ControlService: Send + Sync + 'static {
    fn handle(&self, request: ControlRequest) -> BoxFuture<'static, ControlReply>;
}

impl<F, Fut> ControlService for F
where
    F: Fn(ControlRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ControlReply> + Send + 'static,
{
    fn handle(&self, request: ControlRequest) -> BoxFuture<'static, ControlReply> {
        Box::pin(self(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{SessionKind, StatusCode};

    #[tokio::test]
    async fn test_closure_is_a_service() {
        let service = |request: ControlRequest| async move {
            match request {
                ControlRequest::Stat { .. } => ControlReply::Stat {
                    total: 12,
                    code: StatusCode::OK,
                },
                _ => ControlReply::Status(StatusCode::UNSUPPORTED_ROUTE),
            }
        };

        let reply = service
            .handle(ControlRequest::Stat {
                kind: SessionKind::Conn,
            })
            .await;
        assert_eq!(
            reply,
            ControlReply::Stat {
                total: 12,
                code: StatusCode::OK
            }
        );

        let reply = service.handle(ControlRequest::Heartbeat).await;
        assert_eq!(reply.code(), StatusCode::UNSUPPORTED_ROUTE);
    }
}
