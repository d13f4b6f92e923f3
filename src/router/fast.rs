//! Radix-tree route table.
//!
//! One [`matchit`] tree per HTTP method. O(path-length) lookup, static
//! segments take priority over parameter segments at the same position.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::method::Method;
use crate::request::PathParams;

use super::Router;

/// Marks a repeated parameter name inside one route. Only the first segment
/// carrying a name binds it; later ones still match any single segment.
const SHADOW_MARK: char = '#';

/// Parametrized route table.
///
/// Path parameters use `{name}`; the colon form `:name` is accepted as a
/// synonym. Trees store an index into `handlers` so that re-registering a
/// route swaps the handler instead of tripping matchit's conflict check.
#[derive(Clone, Default)]
pub struct FastRouter {
    trees: HashMap<Method, MatchitRouter<usize>>,
    handlers: Vec<BoxedHandler>,
    installed: HashMap<(Method, String), usize>,
}

impl FastRouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Router for FastRouter {
    fn add_route(&mut self, method: Method, path: &str, handler: BoxedHandler) -> Result<(), Error> {
        let normalized = normalize(path);

        if let Some(&slot) = self.installed.get(&(method, normalized.clone())) {
            self.handlers[slot] = handler;
            return Ok(());
        }

        let slot = self.handlers.len();
        self.trees
            .entry(method)
            .or_default()
            .insert(normalized.clone(), slot)
            .map_err(|e| Error::InvalidRoute {
                method,
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        self.handlers.push(handler);
        self.installed.insert((method, normalized), slot);
        Ok(())
    }

    /// Inserts into a copy of the trees and swaps it in once every route went
    /// in, so a conflict half way through changes nothing.
    fn add_routes(&mut self, routes: Vec<(Method, String, BoxedHandler)>) -> Result<(), Error> {
        let mut staged = self.clone();
        for (method, path, handler) in routes {
            staged.add_route(method, &path, handler)?;
        }
        *self = staged;
        Ok(())
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(BoxedHandler, PathParams)> {
        let matched = self.trees.get(&method)?.at(path).ok()?;
        let handler = Arc::clone(&self.handlers[*matched.value]);

        let mut params = PathParams::new();
        for (name, value) in matched.params.iter() {
            if !name.contains(SHADOW_MARK) {
                params.bind(name, value);
            }
        }
        Some((handler, params))
    }
}

/// Rewrites `:name` segments to `{name}` and renames repeated names so the
/// tree sees each parameter once.
fn normalize(path: &str) -> String {
    let mut seen: Vec<&str> = Vec::new();
    let mut shadowed = 0usize;

    let segments: Vec<String> = path
        .split('/')
        .map(|segment| {
            let name = segment
                .strip_prefix(':')
                .filter(|n| !n.is_empty())
                .or_else(|| segment.strip_prefix('{')?.strip_suffix('}'))
                .filter(|n| !n.is_empty() && !n.starts_with('*'));

            match name {
                Some(name) if seen.contains(&name) => {
                    shadowed += 1;
                    format!("{{{name}{SHADOW_MARK}{shadowed}}}")
                }
                Some(name) => {
                    seen.push(name);
                    format!("{{{name}}}")
                }
                None => segment.to_owned(),
            }
        })
        .collect();

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::request::Request;

    fn named(name: &'static str) -> BoxedHandler {
        handler_fn(move |_req: Request| async move { name })
    }

    async fn hit(router: &FastRouter, method: Method, path: &str) -> Option<(String, PathParams)> {
        let (handler, params) = router.lookup(method, path)?;
        let res = handler.call(Request::new(method, path)).await;
        Some((String::from_utf8(res.body().to_vec()).unwrap(), params))
    }

    #[test]
    fn normalizes_colon_params() {
        assert_eq!(normalize("/users/:id"), "/users/{id}");
        assert_eq!(normalize("/users/{id}/posts"), "/users/{id}/posts");
        assert_eq!(normalize("/1/{something}/:something"), "/1/{something}/{something#1}");
        assert_eq!(normalize("/files/{*rest}"), "/files/{*rest}");
    }

    #[tokio::test]
    async fn binds_first_of_repeated_names() {
        let mut router = FastRouter::new();
        router.add_route(Method::Get, "/svc/v1/1/{something}/:something", named("param")).unwrap();

        let (body, params) = hit(&router, Method::Get, "/svc/v1/1/XYZ/blah").await.unwrap();
        assert_eq!(body, "param");
        assert_eq!(params.get("something"), Some("XYZ"));
        assert_eq!(params.len(), 1);
    }

    #[tokio::test]
    async fn static_segment_beats_parameter() {
        let mut router = FastRouter::new();
        router.add_route(Method::Get, "/users/{id}", named("by-id")).unwrap();
        router.add_route(Method::Get, "/users/me", named("me")).unwrap();

        let (body, params) = hit(&router, Method::Get, "/users/me").await.unwrap();
        assert_eq!(body, "me");
        assert!(params.is_empty());

        let (body, params) = hit(&router, Method::Get, "/users/42").await.unwrap();
        assert_eq!(body, "by-id");
        assert_eq!(params.get("id"), Some("42"));
    }

    #[tokio::test]
    async fn colon_and_brace_forms_are_the_same_route() {
        let mut router = FastRouter::new();
        router.add_route(Method::Put, "/items/{id}", named("brace")).unwrap();
        router.add_route(Method::Put, "/items/:id", named("colon")).unwrap();

        let (body, _) = hit(&router, Method::Put, "/items/7").await.unwrap();
        assert_eq!(body, "colon");
    }

    #[test]
    fn conflicting_parameter_names_are_rejected() {
        let mut router = FastRouter::new();
        router.add_route(Method::Get, "/a/{x}", named("x")).unwrap();
        let err = router.add_route(Method::Get, "/a/{y}", named("y")).unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { method: Method::Get, .. }));
    }

    #[test]
    fn conflicting_batch_installs_nothing() {
        let mut router = FastRouter::new();
        let batch = vec![
            (Method::Get, "/p/a/{x}".to_owned(), named("x")),
            (Method::Get, "/p/a/{y}".to_owned(), named("y")),
        ];

        let err = router.add_routes(batch).unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { ref path, .. } if path == "/p/a/{y}"));
        assert!(router.lookup(Method::Get, "/p/a/1").is_none());

        // The failed batch left no slot behind either.
        router.add_route(Method::Get, "/p/a/{y}", named("y")).unwrap();
        let (_, params) = router.lookup(Method::Get, "/p/a/1").unwrap();
        assert_eq!(params.get("y"), Some("1"));
    }

    #[test]
    fn methods_have_separate_trees() {
        let mut router = FastRouter::new();
        router.add_route(Method::Get, "/a/{x}", named("get")).unwrap();
        router.add_route(Method::Post, "/a/{y}", named("post")).unwrap();

        let (_, params) = router.lookup(Method::Post, "/a/1").unwrap();
        assert_eq!(params.get("y"), Some("1"));
        assert!(router.lookup(Method::Delete, "/a/1").is_none());
    }
}
