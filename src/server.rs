//! Service registration, request dispatch and the HTTP listener.
//!
//! # Lifecycle
//!
//! ```text
//! Server::new(config)        router + monitor built, health route installed
//!        ↓
//! server.register(&svc)*     routes installed, wrapped in middleware
//!        ↓
//! server.serve().await       accept loop; registration is over (serve takes self)
//! ```
//!
//! Every route a service contributes is wrapped, inside out, in
//!
//! 1. the capability middleware (`simple_middleware`, `json_middleware`,
//!    `context_middleware`),
//! 2. the service's transport-level [`Service::middleware`],
//! 3. the server-wide [`Config::middleware`].
//!
//! The health route gets none of them. Requests that match nothing still go
//! through the server-wide middleware before the `404`, and so do the `405`
//! for methods outside RFC 9110 and the `400` for a body that could not be
//! read.
//!
//! # Graceful shutdown and Kubernetes
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. marks the monitor down, so the health route starts answering `503`,
//! 2. cancels every outstanding [`Context`](crate::context::Context),
//! 3. stops accepting connections and lets in-flight ones finish.
//!
//! Set `terminationGracePeriodSeconds` in your pod spec to a value longer
//! than your slowest request.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::context::context_to_http;
use crate::error::Error;
use crate::handler::{BoxedHandler, handler_fn};
use crate::health::{self, HealthCheckKind, Monitor};
use crate::json::json_to_http;
use crate::method::Method;
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::service::Service;

/// Routes requests from a host listener to registered services.
pub struct Server {
    config: Config,
    router: Box<dyn Router>,
    monitor: Arc<Monitor>,
    not_found: BoxedHandler,
    not_allowed: BoxedHandler,
    bad_request: BoxedHandler,
    cancel: watch::Sender<bool>,
}

impl Server {
    /// Builds the configured router backend and installs the health route.
    ///
    /// `Server::new(Config::default())` is a static router with a simple
    /// health check at `/status`.
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        let middleware = config.middleware.as_ref();
        let (cancel, _) = watch::channel(false);

        let mut server = Self {
            router: config.router.build(),
            monitor: Arc::new(Monitor::new()),
            not_found: wrap(middleware, fallback(StatusCode::NOT_FOUND)),
            not_allowed: wrap(middleware, fallback(StatusCode::METHOD_NOT_ALLOWED)),
            bad_request: wrap(middleware, fallback(StatusCode::BAD_REQUEST)),
            cancel,
            config,
        };
        server.register_health_check()?;
        Ok(server)
    }

    /// Installs the health route straight into the router, bypassing all
    /// middleware, and marks the monitor up.
    fn register_health_check(&mut self) -> Result<(), Error> {
        let handler = match self.config.health_check {
            HealthCheckKind::Simple => health::simple(Arc::clone(&self.monitor)),
            HealthCheckKind::Custom => self.config.health_handler.clone().ok_or_else(|| {
                Error::Config("custom health check without a handler".to_owned())
            })?,
        };
        self.router.add_route(Method::Get, &self.config.health_check_path, handler)?;
        self.monitor.mark_up();

        info!(
            path = %self.config.health_check_path,
            kind = ?self.config.health_check,
            "health check registered"
        );
        Ok(())
    }

    /// Installs every endpoint `service` exposes.
    ///
    /// Capabilities are probed independently and installed in the order
    /// plain, JSON, context. Registering a route that is already installed
    /// replaces it. Installation is all or nothing: on any error the router
    /// is left as it was before the call.
    pub fn register(&mut self, service: &dyn Service) -> Result<(), Error> {
        let prefix = service.prefix().trim_end_matches('/');
        let mut routes: Vec<(Method, String, BoxedHandler)> = Vec::new();

        if let Some(svc) = service.as_simple() {
            for (path, methods) in svc.endpoints() {
                for (method, handler) in methods {
                    routes.push((method, join(prefix, &path), svc.simple_middleware(handler)));
                }
            }
        }

        if let Some(svc) = service.as_json() {
            for (path, methods) in svc.json_endpoints() {
                for (method, endpoint) in methods {
                    let handler = json_to_http(svc.json_middleware(endpoint));
                    routes.push((method, join(prefix, &path), handler));
                }
            }
        }

        if let Some(svc) = service.as_context() {
            for (path, methods) in svc.context_endpoints() {
                for (method, endpoint) in methods {
                    let handler = context_to_http(svc.context_middleware(endpoint), self.cancel.subscribe());
                    routes.push((method, join(prefix, &path), handler));
                }
            }
        }

        if routes.is_empty() {
            return Err(Error::NoEndpoints { service: service.name().to_owned() });
        }
        if let Some((method, path, _)) = routes
            .iter()
            .find(|(method, path, _)| *method == Method::Get && *path == self.config.health_check_path)
        {
            return Err(Error::InvalidRoute {
                method: *method,
                path: path.clone(),
                reason: "reserved for the health check".to_owned(),
            });
        }
        if let Some((method, path, _)) = routes.iter().find(|(method, ..)| *method == Method::Extension) {
            return Err(Error::InvalidRoute {
                method: *method,
                path: path.clone(),
                reason: "extension methods cannot be routed".to_owned(),
            });
        }

        let installed: Vec<(Method, String)> =
            routes.iter().map(|(method, path, _)| (*method, path.clone())).collect();
        let routes = routes
            .into_iter()
            .map(|(method, path, handler)| {
                (method, path, wrap(self.config.middleware.as_ref(), service.middleware(handler)))
            })
            .collect();
        self.router.add_routes(routes)?;

        for (method, path) in &installed {
            debug!(service = service.name(), %method, %path, "route installed");
        }
        info!(service = service.name(), prefix, routes = installed.len(), "service registered");
        Ok(())
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    /// Dispatches one request: route lookup, then the wrapped handler.
    ///
    /// Never fails; a miss is a `404` produced behind the server middleware,
    /// or a `405` for [`Method::Extension`].
    pub async fn handle(&self, req: Request) -> Response {
        let _in_flight = self.monitor.track();

        match self.router.lookup(req.method(), req.path()) {
            Some((handler, params)) => handler.call(req.with_params(params)).await,
            None if req.method() == Method::Extension => {
                debug!(path = req.path(), "rejected extension method");
                self.not_allowed.call(req).await
            }
            None => {
                debug!(method = %req.method(), path = req.path(), "no route");
                self.not_found.call(req).await
            }
        }
    }

    /// Answers a request whose body could not be read. Goes through the
    /// server middleware like any miss.
    async fn reject_body(&self, req: Request) -> Response {
        let _in_flight = self.monitor.track();
        self.bad_request.call(req).await
    }

    /// Binds `bind_address` and serves until SIGTERM or Ctrl-C.
    pub async fn serve(self) -> Result<(), Error> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Binds `bind_address` and serves until `signal` resolves.
    ///
    /// Returns only after every in-flight connection has finished.
    pub async fn serve_with_shutdown(self, signal: impl Future<Output = ()>) -> Result<(), Error> {
        if self.config.tls.is_some() {
            return Err(Error::Config(
                "tls is terminated by the fronting proxy; remove the [tls] section".to_owned(),
            ));
        }
        let addr: SocketAddr = self.config.bind_address.parse().map_err(|e| {
            Error::Config(format!("bind_address `{}`: {e}", self.config.bind_address))
        })?;
        let listener = TcpListener::bind(addr).await?;
        self.run(listener, signal).await
    }

    async fn run(self, listener: TcpListener, signal: impl Future<Output = ()>) -> Result<(), Error> {
        let addr = listener.local_addr()?;
        let server = Arc::new(self);

        info!(%addr, "switchyard listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepts even when
                // more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let server = Arc::clone(&server);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let server = Arc::clone(&server);
                            async move { dispatch(server, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        server.monitor.mark_down();
        server.cancel.send_replace(true);

        while tasks.join_next().await.is_some() {}

        info!("switchyard stopped");
        Ok(())
    }
}

/// Applies the server-wide middleware, if any.
fn wrap(middleware: Option<&Middleware>, handler: BoxedHandler) -> BoxedHandler {
    match middleware {
        Some(m) => m(handler),
        None => handler,
    }
}

/// A handler that answers every request with a bare `status`.
fn fallback(status: StatusCode) -> BoxedHandler {
    handler_fn(move |_req: Request| async move { Response::status(status) })
}

fn join(prefix: &str, path: &str) -> String {
    format!("{prefix}{path}")
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Converts one hyper request, runs it through the server, converts the
/// response back.
async fn dispatch<B>(
    server: Arc<Server>,
    req: hyper::Request<B>,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let (parts, body) = req.into_parts();
    let req = Request::from_parts(&parts);

    let response = match body.collect().await {
        Ok(collected) => server.handle(req.with_body(collected.to_bytes())).await,
        Err(e) => {
            debug!(method = %req.method(), path = req.path(), "unreadable body: {e}");
            server.reject_body(req).await
        }
    };
    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM (Unix) or Ctrl-C the process receives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use hyper::body::Frame;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::middleware::{self, Next};

    /// A body whose stream breaks on the first read.
    struct BrokenBody;

    impl hyper::body::Body for BrokenBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
        }
    }

    #[test]
    fn join_trims_nothing_itself() {
        assert_eq!(join("/svc/v1", "/2"), "/svc/v1/2");
        assert_eq!(join("", "/2"), "/2");
    }

    #[tokio::test]
    async fn serves_over_tcp_and_drains() {
        let server = Server::new(Config::default()).unwrap();
        let monitor = Arc::clone(server.monitor());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

        let running = tokio::spawn(server.run(listener, async {
            let _ = stopped.await;
        }));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /status HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.ends_with("ok"), "{raw}");

        stop.send(()).unwrap();
        running.await.unwrap().unwrap();
        assert!(!monitor.is_up());
    }

    #[tokio::test]
    async fn unreadable_body_is_answered_behind_server_middleware() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let counting = middleware::from_fn(move |req: Request, next: Next| {
            counter.fetch_add(1, Ordering::SeqCst);
            next.run(req)
        });
        let server = Arc::new(Server::new(Config::default().with_middleware(counting)).unwrap());

        let req = http::Request::builder().method("PUT").uri("/svc/v1/1").body(BrokenBody).unwrap();
        let res = dispatch(Arc::clone(&server), req).await.unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(server.monitor().in_flight(), 0);
    }

    #[tokio::test]
    async fn refuses_tls_config() {
        let mut config = Config::default();
        config.tls = Some(crate::config::TlsConfig { cert_path: "c".into(), key_path: "k".into() });
        let server = Server::new(config).unwrap();
        assert!(matches!(server.serve_with_shutdown(async {}).await, Err(Error::Config(_))));
    }
}
