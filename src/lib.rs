//! # switchyard
//!
//! Service registration and request dispatch for HTTP services that sit
//! behind a reverse proxy.
//!
//! A [`Server`] owns a route table and a health monitor. Services register
//! with it; each one declares a path prefix and any mix of endpoint kinds:
//!
//! - **plain** handlers: `async fn(Request) -> impl IntoResponse`
//! - **JSON** endpoints: `async fn(Request) -> JsonResult`, encoded for you
//! - **context-aware** handlers: `async fn(Context, Request) -> impl IntoResponse`
//!
//! Routes are wrapped in per-capability, per-service and server-wide
//! [middleware](middleware) at registration time. The health route is not
//! wrapped at all.
//!
//! What the fronting proxy already owns is left to it: TLS termination,
//! body-size limits, rate limiting, slow-client protection.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//!
//! use switchyard::json::{Json, JsonEndpoint, JsonResult, json_endpoint};
//! use switchyard::service::{Endpoints, JsonService, Service};
//! use switchyard::{Config, Method, Request, RouterKind, Server};
//!
//! struct Users;
//!
//! impl Service for Users {
//!     fn prefix(&self) -> &str { "/svc/v1" }
//!     fn as_json(&self) -> Option<&dyn JsonService> { Some(self) }
//! }
//!
//! impl JsonService for Users {
//!     fn json_endpoints(&self) -> Endpoints<JsonEndpoint> {
//!         BTreeMap::from([(
//!             "/users/{id}".to_owned(),
//!             BTreeMap::from([(Method::Get, json_endpoint(get_user))]),
//!         )])
//!     }
//! }
//!
//! async fn get_user(req: Request) -> JsonResult {
//!     Ok(Json::ok(serde_json::json!({ "id": req.param("id") })))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), switchyard::Error> {
//!     let mut server = Server::new(Config::default().with_router(RouterKind::Fast))?;
//!     server.register(&Users)?;
//!     server.serve().await
//! }
//! ```

mod config;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod server;

pub mod context;
pub mod health;
pub mod json;
pub mod middleware;
pub mod postgres;
pub mod router;
pub mod service;

pub use config::{Config, TlsConfig};
pub use error::Error;
pub use handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, handler_fn};
pub use method::Method;
pub use request::{PathParams, Request};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::RouterKind;
pub use server::Server;
