//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! A router holds handlers of *different* concrete types, and middleware has to
//! wrap any of them without knowing which. Both work on one erased shape:
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ handler_fn(hello)
//! Arc::new(FnHandler(hello))                       ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! middleware(handler) -> BoxedHandler              ← wrapped, still erased
//!        ↓
//! handler.call(req)  at request time               ← one vtable dispatch
//! ```
//!
//! JSON and context-aware endpoints have their own erased shapes (see
//! [`json`](crate::json) and [`context`](crate::context)); both are adapted
//! into a [`BoxedHandler`] before they reach the router.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future.
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Erased dispatch interface every route handler ends up behind.
///
/// Implement it directly when a handler needs state that a closure would make
/// awkward; otherwise go through [`handler_fn`].
pub trait ErasedHandler: Send + Sync {
    fn call(&self, req: Request) -> BoxFuture<Response>;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Implemented for every valid route handler function.
///
/// Automatically satisfied for any function or closure shaped like
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is sealed; use [`ErasedHandler`] for hand-written handler types.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Erases a handler function.
///
/// ```rust
/// use switchyard::{handler_fn, BoxedHandler, Request};
///
/// let ok: BoxedHandler = handler_fn(|_req: Request| async { "ok" });
/// ```
pub fn handler_fn(handler: impl Handler) -> BoxedHandler {
    handler.into_boxed_handler()
}

/// Bridges a concrete handler `F` into the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<Response> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
