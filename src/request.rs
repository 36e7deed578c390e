//! Incoming HTTP request type.

use bytes::Bytes;

use crate::method::Method;

/// An incoming HTTP request.
///
/// The path is stored normalized: query string and fragment removed, leading
/// and trailing slashes trimmed. `/users/42/?page=2` becomes `users/42`, and
/// the site root becomes the empty string. Route patterns are trimmed the
/// same way, so the two compare directly.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl Request {
    /// Builds a request from a method and a request URI (path plus optional
    /// query). The method is uppercased.
    ///
    /// ```rust
    /// use serve::Request;
    ///
    /// let req = Request::new("get", "/blog/2024/?draft=1");
    /// assert_eq!(req.method(), "GET");
    /// assert_eq!(req.path(), "blog/2024");
    /// assert_eq!(req.query(), Some("draft=1"));
    /// ```
    pub fn new(method: &str, uri: &str) -> Self {
        let (target, _fragment) = uri.split_once('#').unwrap_or((uri, ""));
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (target, None),
        };
        Self {
            method: method.to_ascii_uppercase(),
            path: path.trim_matches('/').to_owned(),
            query,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub(crate) fn from_parts(parts: &http::request::Parts, body: Bytes) -> Self {
        let mut req = Self::new(
            parts.method.as_str(),
            parts.uri.path_and_query().map_or("/", |pq| pq.as_str()),
        );
        req.headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();
        req.body = body.to_vec();
        req
    }

    /// Adds a header. Returns `self` for chaining.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Replaces the body. Returns `self` for chaining.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// `true` when the request was made with `method`.
    pub fn is(&self, method: Method) -> bool {
        method == *self.method.as_str()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `true` for `X-Requested-With: XMLHttpRequest`.
    pub fn is_ajax(&self) -> bool {
        self.header("x-requested-with")
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
    }
}
