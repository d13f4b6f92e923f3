//! Context-aware endpoints.
//!
//! A context endpoint receives a [`Context`] next to the request. The context
//! carries a cancellation signal the server trips when it starts shutting
//! down; the core never reads it, it only hands it through.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A type-erased context endpoint.
pub type ContextEndpoint = Arc<dyn Fn(Context, Request) -> BoxFuture<Response> + Send + Sync>;

/// Request-scoped context. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Context {
    cancel: watch::Receiver<bool>,
    started: Instant,
}

impl Context {
    pub(crate) fn new(cancel: watch::Receiver<bool>) -> Self {
        Self { cancel, started: Instant::now() }
    }

    /// A context that is never cancelled.
    pub fn background() -> Self {
        let (_, rx) = watch::channel(false);
        Self::new(rx)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once cancellation is signalled. Never resolves for a context
    /// whose source is gone without having cancelled it.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }

    /// Time since the request was handed to the endpoint.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Erases a context endpoint function.
pub fn context_endpoint<F, Fut, R>(f: F) -> ContextEndpoint
where
    F: Fn(Context, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    Arc::new(move |ctx: Context, req: Request| -> BoxFuture<Response> {
        let fut = f(ctx, req);
        Box::pin(async move { fut.await.into_response() })
    })
}

/// Adapts a context endpoint into a transport handler. Each request gets a
/// fresh [`Context`] subscribed to `cancel`.
pub fn context_to_http(endpoint: ContextEndpoint, cancel: watch::Receiver<bool>) -> BoxedHandler {
    Arc::new(ContextAdapter { endpoint, cancel })
}

struct ContextAdapter {
    endpoint: ContextEndpoint,
    cancel: watch::Receiver<bool>,
}

impl ErasedHandler for ContextAdapter {
    fn call(&self, req: Request) -> BoxFuture<Response> {
        (self.endpoint)(Context::new(self.cancel.clone()), req)
    }
}
