//! Outgoing HTTP response type.
//!
//! A single [`Response`] is created per request and handed by mutable
//! reference to every layer of the onion. Layers set its status, headers and
//! body in place; whatever it holds once the chain unwinds is what goes back
//! over the wire.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http_body_util::Full;
use tracing::warn;

use crate::error::Error;
use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`Response::set_body`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Css,          // text/css
    Csv,          // text/csv
    Html,         // text/html; charset=utf-8
    Javascript,   // text/javascript
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css         => "text/css",
            Self::Csv         => "text/csv",
            Self::Html        => "text/html; charset=utf-8",
            Self::Javascript  => "text/javascript",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// Starts out as `200 OK` with no headers and an empty body.
///
/// ```rust
/// use serve::{ContentType, Response, Status};
///
/// let mut res = Response::new();
/// res.set_status(Status::CREATED);
/// res.set_header("location", "/users/42");
/// res.set_body(ContentType::Json, br#"{"id":42}"#.to_vec());
///
/// assert_eq!(res.header("Content-Type"), Some("application/json"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Response {
    pub(crate) status: Status,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response with the given status and no body.
    pub fn with_status(status: impl Into<Status>) -> Self {
        Self { status: status.into(), ..Self::default() }
    }

    pub fn status(&self) -> Status { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub fn set_status(&mut self, status: impl Into<Status>) {
        self.status = status.into();
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value under the same name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    /// Replaces the body and its content type.
    pub fn set_body(&mut self, content_type: ContentType, body: impl Into<Vec<u8>>) {
        self.set_header("content-type", content_type.as_str());
        self.body = body.into();
    }

    /// Plain-text body (`text/plain; charset=utf-8`).
    pub fn set_text(&mut self, body: impl Into<String>) {
        self.set_body(ContentType::Text, body.into().into_bytes());
    }

    /// JSON body (`application/json`). Pass bytes straight from a serialiser.
    pub fn set_json(&mut self, body: Vec<u8>) {
        self.set_body(ContentType::Json, body);
    }

    /// Not-found handling: clears the body, forces `404` and raises
    /// [`Error::NotFound`] so the caller can render its error page.
    pub fn not_found(&mut self, resource: impl Into<String>) -> Result<(), Error> {
        self.status = Status::NOT_FOUND;
        self.body.clear();
        Err(Error::NotFound(resource.into()))
    }

    /// Converts into the hyper response sent on the connection.
    ///
    /// Statuses hyper cannot represent become `500`; headers that are not
    /// valid on the wire are dropped with a warning.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = http::StatusCode::from_u16(self.status.as_u16())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        for (name, value) in self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                (Ok(name), Ok(value)) => {
                    res.headers_mut().append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_header_replaces_existing_value() {
        let mut res = Response::new();
        res.set_header("X-Frame-Options", "DENY");
        res.set_header("x-frame-options", "SAMEORIGIN");
        assert_eq!(res.headers().len(), 1);
        assert_eq!(res.header("X-FRAME-OPTIONS"), Some("SAMEORIGIN"));
    }

    #[test]
    fn not_found_resets_the_response() {
        let mut res = Response::new();
        res.set_text("partial output");
        let err = res.not_found("GET: missing").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref what) if what == "GET: missing"));
        assert_eq!(res.status(), Status::NOT_FOUND);
        assert!(res.body().is_empty());
    }

    #[test]
    fn converts_into_hyper_response() {
        let mut res = Response::with_status(Status::CREATED);
        res.set_header("location", "/users/9");
        res.set_header("bad header", "x");
        res.set_text("made");

        let inner = res.into_inner();
        assert_eq!(inner.status(), http::StatusCode::CREATED);
        assert_eq!(inner.headers()["location"], "/users/9");
        assert_eq!(inner.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(inner.headers().len(), 2);
    }

    #[test]
    fn unrepresentable_status_becomes_500() {
        let inner = Response::with_status(42_u16).into_inner();
        assert_eq!(inner.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
