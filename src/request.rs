//! Incoming HTTP request type and request-scoped path parameters.

use std::collections::HashMap;

use bytes::Bytes;

use crate::method::Method;

/// Named path segments bound by the router for a single request.
///
/// Created fresh by every lookup and owned by the [`Request`] it was matched
/// for, so bindings never leak between requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Binds `name` unless an earlier segment of the same route already did.
    pub(crate) fn bind(&mut self, name: &str, value: &str) {
        self.0.entry(name.to_owned()).or_insert_with(|| value.to_owned());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An incoming HTTP request with its body fully buffered.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Bytes,
    params: PathParams,
}

impl Request {
    /// Builds a request for `uri` (path plus optional `?query`) with no body.
    ///
    /// The transport constructs requests itself; this is for driving
    /// [`Server::handle`](crate::Server::handle) directly.
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (uri.to_owned(), None),
        };
        Self {
            method,
            path,
            query,
            headers: Vec::new(),
            body: Bytes::new(),
            params: PathParams::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn with_params(mut self, params: PathParams) -> Self {
        self.params = params;
        self
    }

    /// Builds the request head from an `http` request coming off the wire.
    /// The body is attached with [`Request::with_body`] once it has been read.
    ///
    /// Methods outside RFC 9110 become [`Method::Extension`].
    pub(crate) fn from_parts(parts: &http::request::Parts) -> Self {
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();

        Self {
            method: Method::try_from(&parts.method).unwrap_or(Method::Extension),
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers,
            body: Bytes::new(),
            params: PathParams::new(),
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All path parameters bound for this request.
    pub fn params(&self) -> &PathParams { &self.params }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    /// Only the parametrized router backend binds parameters.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_query_from_path() {
        let req = Request::new(Method::Get, "/svc/v1/items?limit=10");
        assert_eq!(req.path(), "/svc/v1/items");
        assert_eq!(req.query(), Some("limit=10"));
    }

    #[test]
    fn first_binding_wins() {
        let mut params = PathParams::new();
        params.bind("something", "XYZ");
        params.bind("something", "blah");
        assert_eq!(params.get("something"), Some("XYZ"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn reads_request_head() {
        let (parts, ()) = http::Request::builder()
            .method("PUT")
            .uri("/svc/v1/1?x=y")
            .header("Content-Type", "application/json")
            .body(())
            .unwrap()
            .into_parts();

        let req = Request::from_parts(&parts).with_body(Bytes::from_static(b"{}"));
        assert_eq!(req.method(), Method::Put);
        assert_eq!(req.path(), "/svc/v1/1");
        assert_eq!(req.query(), Some("x=y"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body(), b"{}");
    }

    #[test]
    fn unknown_method_becomes_extension() {
        let (parts, ()) = http::Request::builder()
            .method("PURGE")
            .uri("/")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(Request::from_parts(&parts).method(), Method::Extension);
    }
}
