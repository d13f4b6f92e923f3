//! JSON endpoints.
//!
//! A JSON endpoint returns a status and a value to encode instead of building
//! a [`Response`] itself. The status it picks is written verbatim on success
//! *and* on failure; the adapter never infers one from the error.
//!
//! ```rust
//! use http::StatusCode;
//! use serde::Deserialize;
//! use switchyard::json::{Json, JsonError, JsonResult};
//! use switchyard::Request;
//!
//! #[derive(Deserialize, serde::Serialize)]
//! struct Greeting { hello: String, howdy: String }
//!
//! async fn put_greeting(req: Request) -> JsonResult {
//!     let greeting: Greeting = serde_json::from_slice(req.body())
//!         .map_err(|e| JsonError::new(StatusCode::BAD_REQUEST, e))?;
//!     Ok(Json::ok(greeting))
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

/// What a JSON endpoint hands back to the adapter.
pub type JsonResult = Result<Json, JsonError>;

/// A type-erased JSON endpoint.
pub type JsonEndpoint = Arc<dyn Fn(Request) -> BoxFuture<JsonResult> + Send + Sync>;

/// A successful JSON reply: status plus the value to encode.
#[derive(Debug)]
pub struct Json {
    status: StatusCode,
    body: Result<serde_json::Value, serde_json::Error>,
}

impl Json {
    /// `()` and `None` encode as `null`.
    pub fn new(status: StatusCode, body: impl Serialize) -> Self {
        Self { status, body: serde_json::to_value(body) }
    }

    pub fn ok(body: impl Serialize) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn status(&self) -> StatusCode { self.status }
}

/// A failed JSON reply. Encoded as `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonError {
    status: StatusCode,
    message: String,
}

impl JsonError {
    pub fn new(status: StatusCode, err: impl fmt::Display) -> Self {
        Self { status, message: err.to_string() }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn message(&self) -> &str { &self.message }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for JsonError {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Erases a JSON endpoint function.
pub fn json_endpoint<F, Fut>(f: F) -> JsonEndpoint
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JsonResult> + Send + 'static,
{
    Arc::new(move |req: Request| -> BoxFuture<JsonResult> { Box::pin(f(req)) })
}

/// Adapts a JSON endpoint into a transport handler.
///
/// The endpoint reads the request body itself; the adapter only encodes what
/// comes back.
pub fn json_to_http(endpoint: JsonEndpoint) -> BoxedHandler {
    Arc::new(JsonAdapter(endpoint))
}

struct JsonAdapter(JsonEndpoint);

impl ErasedHandler for JsonAdapter {
    fn call(&self, req: Request) -> BoxFuture<Response> {
        let fut = (self.0)(req);
        Box::pin(async move { render(fut.await) })
    }
}

fn render(result: JsonResult) -> Response {
    match result {
        Ok(Json { status, body: Ok(value) }) => match serde_json::to_vec(&value) {
            Ok(bytes) => Response::builder().status(status).json(bytes),
            Err(e) => encoding_failed(e),
        },
        Ok(Json { body: Err(e), .. }) => encoding_failed(e),
        Err(JsonError { status, message }) => error_body(status, &message),
    }
}

fn encoding_failed(e: serde_json::Error) -> Response {
    error!("failed to encode json response: {e}");
    error_body(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
}

fn error_body(status: StatusCode, message: &str) -> Response {
    // A struct of one &str field always encodes.
    let bytes = serde_json::to_vec(&ErrorBody { error: message }).unwrap_or_default();
    Response::builder().status(status).json(bytes)
}
