//! Minimal switchyard example: one service mixing plain, JSON and
//! context-aware endpoints behind a tracing middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:8080/svc/v1/users/42
//!   curl -X PUT http://localhost:8080/svc/v1/users/42 \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl http://localhost:8080/svc/v1/slow
//!   curl http://localhost:8080/status

use std::collections::BTreeMap;
use std::time::Duration;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use switchyard::context::{Context, ContextEndpoint, context_endpoint};
use switchyard::json::{Json, JsonEndpoint, JsonError, JsonResult, json_endpoint};
use switchyard::service::{ContextService, Endpoints, JsonService, Service, SimpleService};
use switchyard::{BoxedHandler, Config, Method, Request, RouterKind, Server, handler_fn, middleware};

#[derive(Serialize, Deserialize)]
struct User {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct UpdateUser {
    name: String,
}

struct Users;

impl Service for Users {
    fn prefix(&self) -> &str { "/svc/v1" }
    fn as_simple(&self) -> Option<&dyn SimpleService> { Some(self) }
    fn as_json(&self) -> Option<&dyn JsonService> { Some(self) }
    fn as_context(&self) -> Option<&dyn ContextService> { Some(self) }
}

impl SimpleService for Users {
    fn endpoints(&self) -> Endpoints<BoxedHandler> {
        BTreeMap::from([(
            "/ping".to_owned(),
            BTreeMap::from([(Method::Get, handler_fn(|_req: Request| async { "pong" }))]),
        )])
    }
}

impl JsonService for Users {
    fn json_endpoints(&self) -> Endpoints<JsonEndpoint> {
        BTreeMap::from([(
            "/users/{id}".to_owned(),
            BTreeMap::from([
                (Method::Get, json_endpoint(get_user)),
                (Method::Put, json_endpoint(put_user)),
            ]),
        )])
    }
}

impl ContextService for Users {
    fn context_endpoints(&self) -> Endpoints<ContextEndpoint> {
        BTreeMap::from([(
            "/slow".to_owned(),
            BTreeMap::from([(Method::Get, context_endpoint(slow))]),
        )])
    }
}

// GET /svc/v1/users/{id}
async fn get_user(req: Request) -> JsonResult {
    let id = req.param("id").unwrap_or("unknown").to_owned();
    Ok(Json::ok(User { id, name: "alice".to_owned() }))
}

// PUT /svc/v1/users/{id}
async fn put_user(req: Request) -> JsonResult {
    let update: UpdateUser = serde_json::from_slice(req.body())
        .map_err(|e| JsonError::new(StatusCode::BAD_REQUEST, e))?;
    let id = req.param("id").unwrap_or("unknown").to_owned();
    Ok(Json::new(StatusCode::ACCEPTED, User { id, name: update.name }))
}

// GET /svc/v1/slow: gives up early when the server starts draining.
async fn slow(ctx: Context, _req: Request) -> (StatusCode, &'static str) {
    tokio::select! {
        () = tokio::time::sleep(Duration::from_secs(5)) => (StatusCode::OK, "done"),
        () = ctx.cancelled() => (StatusCode::SERVICE_UNAVAILABLE, "shutting down"),
    }
}

#[tokio::main]
async fn main() -> Result<(), switchyard::Error> {
    tracing_subscriber::fmt::init();

    let config = Config::default()
        .with_router(RouterKind::Fast)
        .with_middleware(middleware::trace());

    let mut server = Server::new(config)?;
    server.register(&Users)?;
    server.serve().await
}
