//! Handler registry for dispatching data requests by route.
//!
//! Data frames carry an application route byte. The registry maps each route to a handler;
//! route 0 is reserved by the frame header and cannot be registered.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = HandlerRegistry::new();
//!
//! registry.register(20, |req: Request| async move {
//!     req.respond(&"pong").await
//! });
//!
//! registry.register_typed(21, |text: String, req: Request| async move {
//!     req.respond(&text.to_uppercase()).await
//! });
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::Request;
use crate::error::{ClusterwireError, Result};

/// Result type for handler functions.
pub type HandlerResult = Result<()>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for data-route handlers.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(request))
    }
}

/// Wrapper that decodes the payload before calling the handler.
pub struct TypedHandler<F, T, Fut>
where
    F: Fn(T, Request) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<F, T, Fut> TypedHandler<F, T, Fut>
where
    F: Fn(T, Request) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }

    /// Decode the payload and run the wrapped handler.
    pub fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult> {
        let parsed: T = match request.parse() {
            Ok(v) => v,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        Box::pin((self.handler)(parsed, request))
    }
}

/// Registry mapping data routes to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<u8, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler that receives the whole request.
    ///
    /// A later registration for the same route replaces the earlier one.
    ///
    /// # Panics
    ///
    /// Panics if `route` is 0.
    pub fn register<F, Fut>(&mut self, route: u8, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        assert!(route != 0, "route 0 is reserved");
        self.handlers.insert(route, Arc::new(handler));
    }

    /// Register a handler that receives the decoded payload alongside the request.
    pub fn register_typed<F, T, Fut>(&mut self, route: u8, handler: F)
    where
        F: Fn(T, Request) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let typed = TypedHandler::new(handler);
        self.register(route, move |request: Request| typed.call(request));
    }

    pub fn get(&self, route: u8) -> Option<Arc<dyn Handler>> {
        self.handlers.get(&route).cloned()
    }

    pub fn contains(&self, route: u8) -> bool {
        self.handlers.contains_key(&route)
    }

    /// Registered routes in ascending order.
    pub fn routes(&self) -> Vec<u8> {
        let mut routes: Vec<u8> = self.handlers.keys().copied().collect();
        routes.sort_unstable();
        routes
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatch a request to the handler registered for its route.
    pub async fn dispatch(&self, request: Request) -> Result<()> {
        let handler = self
            .get(request.route())
            .ok_or(ClusterwireError::HandlerNotFound(request.route()))?;

        handler.call(request).await
    }
}
