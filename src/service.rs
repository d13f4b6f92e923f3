//! What a service can contribute to a server.
//!
//! A service is any object implementing [`Service`]. On its own that trait
//! only carries a prefix and a transport-level middleware; the routes come
//! from the capability traits it *also* implements:
//!
//! | Capability | Endpoint type | Capability middleware |
//! |---|---|---|
//! | [`SimpleService`] | [`BoxedHandler`] | [`SimpleService::simple_middleware`] |
//! | [`JsonService`] | [`JsonEndpoint`] | [`JsonService::json_middleware`] |
//! | [`ContextService`] | [`ContextEndpoint`] | [`ContextService::context_middleware`] |
//!
//! The server probes each capability through the `as_*` methods on
//! [`Service`], so a service advertises a capability by overriding the
//! matching probe to return `Some(self)`:
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use switchyard::service::{Endpoints, Service, SimpleService};
//! use switchyard::{BoxedHandler, Method, Request, handler_fn};
//!
//! struct Hello;
//!
//! impl Service for Hello {
//!     fn prefix(&self) -> &str { "/svc/v1" }
//!     fn as_simple(&self) -> Option<&dyn SimpleService> { Some(self) }
//! }
//!
//! impl SimpleService for Hello {
//!     fn endpoints(&self) -> Endpoints<BoxedHandler> {
//!         BTreeMap::from([(
//!             "/hello".to_owned(),
//!             BTreeMap::from([(Method::Get, handler_fn(|_req: Request| async { "hi" }))]),
//!         )])
//!     }
//! }
//! ```
//!
//! Any number of capabilities can be combined on one type. A service whose
//! probes all come back empty is rejected at registration.

use std::collections::BTreeMap;

use crate::context::ContextEndpoint;
use crate::handler::BoxedHandler;
use crate::json::JsonEndpoint;
use crate::method::Method;

/// Relative path → method → endpoint.
pub type Endpoints<H> = BTreeMap<String, BTreeMap<Method, H>>;

/// An object that contributes routes to a [`Server`](crate::Server).
pub trait Service: Send + Sync {
    /// Prepended to every relative path this service declares.
    fn prefix(&self) -> &str;

    /// Used in logs and registration errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Wraps every route this service contributes, whatever its capability.
    fn middleware(&self, handler: BoxedHandler) -> BoxedHandler {
        handler
    }

    fn as_simple(&self) -> Option<&dyn SimpleService> { None }
    fn as_json(&self) -> Option<&dyn JsonService> { None }
    fn as_context(&self) -> Option<&dyn ContextService> { None }
}

/// Routes served by plain request → response handlers.
pub trait SimpleService: Service {
    fn endpoints(&self) -> Endpoints<BoxedHandler>;

    fn simple_middleware(&self, handler: BoxedHandler) -> BoxedHandler {
        handler
    }
}

/// Routes served by [JSON endpoints](crate::json).
pub trait JsonService: Service {
    fn json_endpoints(&self) -> Endpoints<JsonEndpoint>;

    fn json_middleware(&self, endpoint: JsonEndpoint) -> JsonEndpoint {
        endpoint
    }
}

/// Routes served by [context-aware endpoints](crate::context).
pub trait ContextService: Service {
    fn context_endpoints(&self) -> Endpoints<ContextEndpoint>;

    fn context_middleware(&self, endpoint: ContextEndpoint) -> ContextEndpoint {
        endpoint
    }
}
