//! Unified error type.

use crate::method::Method;
use crate::status::Status;

/// Boxed error raised by user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by serve's fallible operations.
///
/// Routing failures ([`NotFound`](Error::NotFound),
/// [`MethodNotAllowed`](Error::MethodNotAllowed)) are caller-visible and map
/// onto HTTP statuses through [`Error::status`]. Everything else is either a
/// programming error ([`Locked`](Error::Locked)), a failure to resolve or run
/// a callback, or infrastructure (binding a socket).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No route matched the request path, or the response ended the chain
    /// with a `404` status.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path matched at least one route but none for this method.
    #[error("page requested over \"{method}\", only \"{methods}\" is accepted", methods = join(.allowed))]
    MethodNotAllowed { method: String, allowed: Vec<Method> },

    /// A layer was added while the onion was being peeled.
    #[error("middleware can't be added once the onion is being peeled")]
    Locked,

    /// A `Class@method` or `Class::method` reference named a class the
    /// callable registry does not know.
    #[error("no class `{0}` is registered")]
    UnknownClass(String),

    /// The class is known but has no method by that name.
    #[error("class `{class}` has no method `{method}`")]
    UnknownMethod { class: String, method: String },

    /// Any error raised by a user callback.
    #[error("callback failed: {0}")]
    Callback(#[source] BoxError),

    #[error("invalid socket address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps an arbitrary error raised inside a callback.
    pub fn callback(e: impl Into<BoxError>) -> Self {
        Self::Callback(e.into())
    }

    /// The HTTP status a routing failure maps to. `None` for everything that
    /// is not a routing failure.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::NotFound(_)             => Some(Status::NOT_FOUND),
            Self::MethodNotAllowed { .. } => Some(Status::METHOD_NOT_ALLOWED),
            _                             => None,
        }
    }

    /// Methods reported by a [`MethodNotAllowed`](Error::MethodNotAllowed)
    /// failure; empty for every other variant.
    pub fn allowed_methods(&self) -> &[Method] {
        match self {
            Self::MethodNotAllowed { allowed, .. } => allowed,
            _ => &[],
        }
    }
}

fn join(methods: &[Method]) -> String {
    methods.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_failures_map_to_statuses() {
        let e = Error::MethodNotAllowed { method: "PUT".into(), allowed: vec![Method::Post] };
        assert_eq!(e.status(), Some(Status::METHOD_NOT_ALLOWED));
        assert_eq!(e.allowed_methods(), &[Method::Post]);
        assert_eq!(e.to_string(), r#"page requested over "PUT", only "POST" is accepted"#);

        assert_eq!(Error::NotFound("GET: x".into()).status(), Some(Status::NOT_FOUND));
        assert_eq!(Error::Locked.status(), None);
        assert!(Error::Locked.allowed_methods().is_empty());
    }

    #[test]
    fn callback_errors_keep_their_source() {
        let e = Error::callback("database is down");
        assert_eq!(e.to_string(), "callback failed: database is down");
        assert!(std::error::Error::source(&e).is_some());
    }
}
