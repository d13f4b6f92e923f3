//! Route tables.
//!
//! The server only needs two things from a route table: put a handler under a
//! method + path, and find it again at request time. [`Router`] is that
//! contract; [`SimpleRouter`] and [`FastRouter`] are the two backends,
//! picked by [`RouterKind`] in the server config.
//!
//! | Backend | Matching | Path parameters |
//! |---|---|---|
//! | [`SimpleRouter`] | exact method + path, one hash lookup | never bound |
//! | [`FastRouter`] | radix tree per method via [`matchit`] | `{name}` and `:name` |
//!
//! `SimpleRouter` stores `/users/{id}` as a literal path: a request has to
//! send the braces to reach it. Routes that need parameters belong on
//! `FastRouter`.
//!
//! Both backends are last-registration-wins for an identical method + path,
//! and both install a batch of routes atomically.

mod fast;
mod simple;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::method::Method;
use crate::request::PathParams;

pub use fast::FastRouter;
pub use simple::SimpleRouter;

/// A method + path route table.
///
/// Populated during registration and only read once the server is serving,
/// so implementations need no interior locking.
pub trait Router: Send + Sync {
    /// Installs `handler` for `method` + `path`, replacing any handler already
    /// installed for exactly the same pair.
    fn add_route(&mut self, method: Method, path: &str, handler: BoxedHandler) -> Result<(), Error>;

    /// Installs a batch of routes, all or none. On error the table is exactly
    /// as it was before the call.
    fn add_routes(&mut self, routes: Vec<(Method, String, BoxedHandler)>) -> Result<(), Error>;

    /// Finds the handler for a request. `None` means not found; the caller
    /// decides what goes on the wire.
    fn lookup(&self, method: Method, path: &str) -> Option<(BoxedHandler, PathParams)>;
}

/// Which [`Router`] backend a server is built with.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouterKind {
    #[default]
    #[serde(alias = "default")]
    Simple,
    #[serde(alias = "parametrized")]
    Fast,
}

impl RouterKind {
    pub fn build(self) -> Box<dyn Router> {
        match self {
            Self::Simple => Box::new(SimpleRouter::new()),
            Self::Fast   => Box::new(FastRouter::new()),
        }
    }
}
