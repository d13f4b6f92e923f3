//! Services shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use switchyard::context::{Context, ContextEndpoint, context_endpoint};
use switchyard::json::{Json, JsonEndpoint, JsonError, JsonResult, json_endpoint};
use switchyard::service::{ContextService, Endpoints, JsonService, Service, SimpleService};
use switchyard::{BoxedHandler, Method, Request, Response, Server, handler_fn};

pub const PREFIX: &str = "/svc/v1";

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Greeting {
    pub hello: String,
    pub howdy: String,
}

pub fn endpoints<H>(routes: impl IntoIterator<Item = (&'static str, Method, H)>) -> Endpoints<H> {
    let mut map: Endpoints<H> = BTreeMap::new();
    for (path, method, handler) in routes {
        map.entry(path.to_owned()).or_default().insert(method, handler);
    }
    map
}

pub async fn send(server: &Server, method: Method, uri: &str) -> Response {
    server.handle(Request::new(method, uri)).await
}

pub fn body(res: &Response) -> &str {
    std::str::from_utf8(res.body()).unwrap()
}

// ── Plain ─────────────────────────────────────────────────────────────────────

pub struct SimpleSvc;

impl Service for SimpleSvc {
    fn prefix(&self) -> &str { PREFIX }
    fn as_simple(&self) -> Option<&dyn SimpleService> { Some(self) }
}

impl SimpleService for SimpleSvc {
    fn endpoints(&self) -> Endpoints<BoxedHandler> {
        endpoints([
            ("/1/{something}/:something", Method::Get, handler_fn(get_something)),
            ("/2", Method::Get, handler_fn(|_req: Request| async { "ok" })),
        ])
    }
}

async fn get_something(req: Request) -> String {
    req.param("something").unwrap_or_default().to_owned()
}

// ── JSON ──────────────────────────────────────────────────────────────────────

pub struct JsonSvc;

impl Service for JsonSvc {
    fn prefix(&self) -> &str { PREFIX }
    fn as_json(&self) -> Option<&dyn JsonService> { Some(self) }
}

impl JsonService for JsonSvc {
    fn json_endpoints(&self) -> Endpoints<JsonEndpoint> {
        endpoints([
            ("/1", Method::Put, json_endpoint(put_json)),
            ("/2", Method::Get, json_endpoint(|_req: Request| async {
                Ok(Json::ok(Greeting { hello: "hi".into(), howdy: "howdy".into() }))
            })),
            ("/3/{something}/:something", Method::Get, json_endpoint(|req: Request| async move {
                let something = req.param("something").unwrap_or_default().to_owned();
                Ok(Json::ok(Greeting { hello: "hi".into(), howdy: something }))
            })),
        ])
    }
}

async fn put_json(req: Request) -> JsonResult {
    let greeting: Greeting = serde_json::from_slice(req.body())
        .map_err(|e| JsonError::new(StatusCode::BAD_REQUEST, e))?;
    Ok(Json::ok(greeting))
}

// ── Context ───────────────────────────────────────────────────────────────────

pub struct ContextSvc;

impl Service for ContextSvc {
    fn prefix(&self) -> &str { PREFIX }
    fn as_context(&self) -> Option<&dyn ContextService> { Some(self) }
}

impl ContextService for ContextSvc {
    fn context_endpoints(&self) -> Endpoints<ContextEndpoint> {
        endpoints([
            ("/ctx/1/{something}/:something", Method::Get, context_endpoint(|_ctx: Context, req: Request| async move {
                req.param("something").unwrap_or_default().to_owned()
            })),
            ("/ctx/2", Method::Get, context_endpoint(|ctx: Context, _req: Request| async move {
                if ctx.is_cancelled() { "cancelled" } else { "ok" }
            })),
        ])
    }
}

// ── Mixed ─────────────────────────────────────────────────────────────────────

pub struct MixedSvc;

impl Service for MixedSvc {
    fn prefix(&self) -> &str { PREFIX }
    fn as_simple(&self) -> Option<&dyn SimpleService> { Some(self) }
    fn as_json(&self) -> Option<&dyn JsonService> { Some(self) }
}

impl SimpleService for MixedSvc {
    fn endpoints(&self) -> Endpoints<BoxedHandler> {
        endpoints([("/simple", Method::Get, handler_fn(|_req: Request| async { "ok" }))])
    }
}

impl JsonService for MixedSvc {
    fn json_endpoints(&self) -> Endpoints<JsonEndpoint> {
        endpoints([("/json", Method::Get, json_endpoint(|_req: Request| async {
            Ok(Json::ok(Greeting { hello: "hi".into(), howdy: "howdy".into() }))
        }))])
    }
}

// ── Invalid ───────────────────────────────────────────────────────────────────

/// Has a prefix and middleware but no endpoints of any kind.
pub struct InvalidSvc;

impl Service for InvalidSvc {
    fn prefix(&self) -> &str { PREFIX }
}

/// Claims the simple capability but returns nothing.
pub struct EmptySvc;

impl Service for EmptySvc {
    fn prefix(&self) -> &str { PREFIX }
    fn as_simple(&self) -> Option<&dyn SimpleService> { Some(self) }
}

impl SimpleService for EmptySvc {
    fn endpoints(&self) -> Endpoints<BoxedHandler> {
        Endpoints::new()
    }
}
