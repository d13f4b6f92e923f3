//! Health-check endpoint and the monitor behind it.
//!
//! The health route is installed by [`Server::new`](crate::Server::new),
//! straight into the router. It never goes through service or server
//! middleware, so a load balancer can still see the process while user
//! middleware is failing or stuck.
//!
//! | Kind | Up | Draining |
//! |---|---|---|
//! | [`HealthCheckKind::Simple`] | `200 ok` | `503 service unavailable` |
//! | [`HealthCheckKind::Custom`] | whatever the supplied handler returns | same |

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

pub const DEFAULT_PATH: &str = "/status";

/// Which health handler a server installs.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthCheckKind {
    /// Fixed liveness payload gated on the [`Monitor`].
    #[default]
    Simple,
    /// The handler passed to [`Config::with_health_handler`](crate::Config::with_health_handler).
    Custom,
}

/// Per-server liveness state.
///
/// Owned by one [`Server`](crate::Server); two servers in one process never
/// share a monitor. The server flips it up once the health route is in place
/// and down when it starts draining.
#[derive(Debug)]
pub struct Monitor {
    up: AtomicBool,
    in_flight: AtomicUsize,
}

impl Monitor {
    pub(crate) fn new() -> Self {
        Self {
            up: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::Acquire)
    }

    /// Requests currently being dispatched.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn mark_up(&self) {
        if !self.up.swap(true, Ordering::AcqRel) {
            info!("monitor up");
        }
    }

    pub(crate) fn mark_down(&self) {
        if self.up.swap(false, Ordering::AcqRel) {
            info!(in_flight = self.in_flight(), "monitor down");
        }
    }

    /// Counts one request until the guard is dropped.
    pub(crate) fn track(self: &Arc<Self>) -> InFlight {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        InFlight(Arc::clone(self))
    }
}

pub(crate) struct InFlight(Arc<Monitor>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// The [`HealthCheckKind::Simple`] handler.
pub fn simple(monitor: Arc<Monitor>) -> BoxedHandler {
    Arc::new(SimpleHealthCheck(monitor))
}

struct SimpleHealthCheck(Arc<Monitor>);

impl ErasedHandler for SimpleHealthCheck {
    fn call(&self, _req: Request) -> BoxFuture<Response> {
        let res = if self.0.is_up() {
            Response::text("ok")
        } else {
            Response::builder()
                .status(StatusCode::SERVICE_UNAVAILABLE)
                .text("service unavailable")
        };
        Box::pin(std::future::ready(res))
    }
}
