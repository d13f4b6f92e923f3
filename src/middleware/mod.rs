//! Middleware layer.
//!
//! A middleware is a transformer from one [`BoxedHandler`] to another. It runs
//! once per route at registration time; the handler it returns runs once per
//! request. That is the whole model:
//!
//! ```text
//! server middleware ( service middleware ( capability middleware ( handler ) ) )
//!        outermost                                                 innermost
//! ```
//!
//! The health-check route is installed before any of this and never wrapped.
//!
//! [`from_fn`] covers the common case of "do something around the next
//! handler"; [`Chain`] composes several middlewares in an explicit order.

mod trace;

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

pub use trace::trace;

/// A handler-to-handler transformer.
pub type Middleware = Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync>;

/// The handler a [`from_fn`] middleware wraps.
#[derive(Clone)]
pub struct Next(BoxedHandler);

impl Next {
    pub async fn run(self, req: Request) -> Response {
        self.0.call(req).await
    }
}

/// Builds a middleware from an async function of the request and the rest of
/// the chain.
///
/// ```rust
/// use switchyard::middleware::{self, Next};
/// use switchyard::{Request, Response};
///
/// let tagged = middleware::from_fn(|req: Request, next: Next| async move {
///     let mut res: Response = next.run(req).await;
///     res.headers_mut().push(("x-served-by".to_owned(), "switchyard".to_owned()));
///     res
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |inner: BoxedHandler| -> BoxedHandler {
        Arc::new(FromFn { f: Arc::clone(&f), inner })
    })
}

struct FromFn<F> {
    f: Arc<F>,
    inner: BoxedHandler,
}

impl<F, Fut> ErasedHandler for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<Response> {
        Box::pin((self.f)(req, Next(Arc::clone(&self.inner))))
    }
}

/// Returns the handler untouched.
pub fn identity() -> Middleware {
    Arc::new(|handler: BoxedHandler| handler)
}

/// An ordered list of middlewares.
///
/// The first one pushed is the outermost: it sees the request first and the
/// response last. Applying the same chain to two handlers wraps both in the
/// same order.
#[derive(Clone, Default)]
pub struct Chain {
    layers: Vec<Middleware>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, middleware: Middleware) -> Self {
        self.layers.push(middleware);
        self
    }

    pub fn len(&self) -> usize { self.layers.len() }
    pub fn is_empty(&self) -> bool { self.layers.is_empty() }

    pub fn apply(&self, handler: BoxedHandler) -> BoxedHandler {
        self.layers.iter().rev().fold(handler, |inner, layer| layer(inner))
    }

    /// Collapses the chain into a single [`Middleware`].
    pub fn into_middleware(self) -> Middleware {
        Arc::new(move |handler: BoxedHandler| self.apply(handler))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::StatusCode;

    use super::*;
    use crate::handler::handler_fn;
    use crate::method::Method;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Middleware {
        let log = Arc::clone(log);
        from_fn(move |req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{name}:before"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("{name}:after"));
                res
            }
        })
    }

    #[tokio::test]
    async fn chain_wraps_first_pushed_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new()
            .with(recorder(&log, "outer"))
            .with(recorder(&log, "inner"));

        let inner_log = Arc::clone(&log);
        let handler = handler_fn(move |_req: Request| {
            let log = Arc::clone(&inner_log);
            async move {
                log.lock().unwrap().push("handler".to_owned());
                "ok"
            }
        });

        chain.apply(handler).call(Request::new(Method::Get, "/")).await;

        assert_eq!(
            *log.lock().unwrap(),
            ["outer:before", "inner:before", "handler", "inner:after", "outer:after"],
        );
    }

    #[tokio::test]
    async fn applying_twice_gives_the_same_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new()
            .with(recorder(&log, "a"))
            .with(recorder(&log, "b"))
            .into_middleware();

        let first = chain(handler_fn(|_req: Request| async { "" }));
        let second = chain(handler_fn(|_req: Request| async { "" }));

        first.call(Request::new(Method::Get, "/")).await;
        let once = std::mem::take(&mut *log.lock().unwrap());
        second.call(Request::new(Method::Get, "/")).await;
        let twice = std::mem::take(&mut *log.lock().unwrap());

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let deny = from_fn(|_req: Request, _next: Next| async { Response::status(StatusCode::FORBIDDEN) });
        let handler = deny(handler_fn(|_req: Request| async { "unreachable" }));

        let res = handler.call(Request::new(Method::Get, "/")).await;
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn identity_and_empty_chain_change_nothing() {
        let handler = identity()(Chain::new().apply(handler_fn(|_req: Request| async { "ok" })));
        assert_eq!(handler.call(Request::new(Method::Get, "/")).await.body(), b"ok");
    }
}
