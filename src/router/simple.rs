//! Exact-match route table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::method::Method;
use crate::request::PathParams;

use super::Router;

/// One hash lookup per request; paths are compared byte for byte.
///
/// Placeholder segments are not interpreted. `/1/{something}/:something` is
/// stored, and only matched, as exactly that string.
#[derive(Clone, Default)]
pub struct SimpleRouter {
    routes: HashMap<Method, HashMap<String, BoxedHandler>>,
}

impl SimpleRouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Router for SimpleRouter {
    fn add_route(&mut self, method: Method, path: &str, handler: BoxedHandler) -> Result<(), Error> {
        if !path.starts_with('/') {
            return Err(Error::InvalidRoute {
                method,
                path: path.to_owned(),
                reason: "path must start with `/`".to_owned(),
            });
        }
        self.routes.entry(method).or_default().insert(path.to_owned(), handler);
        Ok(())
    }

    fn add_routes(&mut self, routes: Vec<(Method, String, BoxedHandler)>) -> Result<(), Error> {
        let mut staged = self.clone();
        for (method, path, handler) in routes {
            staged.add_route(method, &path, handler)?;
        }
        *self = staged;
        Ok(())
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(BoxedHandler, PathParams)> {
        let handler = self.routes.get(&method)?.get(path)?;
        Some((Arc::clone(handler), PathParams::new()))
    }
}
