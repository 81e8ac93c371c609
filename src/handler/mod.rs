//! Handler module - inbound request handling.
//!
//! Provides:
//! - [`Request`] - façade over one inbound data frame, with respond/bind/unbind actions
//! - [`Proxy`] - the collaborator those actions are delegated to ([`ConnectionProxy`] by default)
//! - [`HandlerRegistry`] - maps data routes to handlers
//! - [`ControlService`] - decides the outcome of inbound control requests

mod context;
mod proxy;
mod registry;
mod request;
mod service;

pub use context::RequestContext;
pub use proxy::{ConnectionProxy, Proxy};
pub use registry::{BoxFuture, Handler, HandlerRegistry, HandlerResult, TypedHandler};
pub use request::{Payload, Request};
pub use service::ControlService;
