//! HTTP status codes.
//!
//! A [`Response`](crate::Response) carries its status as a mutable [`Status`]
//! value. Layers read it to decide what to do, rewrite it, or leave it alone.
//! When the onion runs out of layers and the status is still `404`, the
//! response's not-found handling is triggered.
//!
//! ```rust
//! use serve::{Response, Status};
//!
//! let mut res = Response::new();
//! assert_eq!(res.status(), Status::OK);
//!
//! res.set_status(Status::NOT_FOUND);
//! assert!(res.status().is_not_found());
//! assert!(res.status().is_client_error());
//!
//! res.set_status(204_u16);
//! assert!(res.status().is_empty());
//! ```

use std::fmt;

/// An HTTP status code.
///
/// Any `u16` converts into a `Status`; codes outside `100..=599` are kept
/// as-is and reported by [`Status::is_invalid`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Status(u16);

impl Status {
    // ── 1xx Informational ─────────────────────────────────────────────────────
    pub const CONTINUE: Status                        = Status(100);
    pub const SWITCHING_PROTOCOLS: Status             = Status(101);

    // ── 2xx Success ───────────────────────────────────────────────────────────
    pub const OK: Status                              = Status(200);
    pub const CREATED: Status                         = Status(201);
    pub const ACCEPTED: Status                        = Status(202);
    pub const NO_CONTENT: Status                      = Status(204);

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    pub const MOVED_PERMANENTLY: Status               = Status(301);
    pub const FOUND: Status                           = Status(302);
    pub const SEE_OTHER: Status                       = Status(303);
    pub const NOT_MODIFIED: Status                    = Status(304);
    pub const TEMPORARY_REDIRECT: Status              = Status(307);
    pub const PERMANENT_REDIRECT: Status              = Status(308);

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    pub const BAD_REQUEST: Status                     = Status(400);
    pub const UNAUTHORIZED: Status                    = Status(401);
    pub const FORBIDDEN: Status                       = Status(403);
    pub const NOT_FOUND: Status                       = Status(404);
    pub const METHOD_NOT_ALLOWED: Status              = Status(405);
    pub const CONFLICT: Status                        = Status(409);
    pub const GONE: Status                            = Status(410);
    pub const UNPROCESSABLE_CONTENT: Status           = Status(422);
    pub const TOO_MANY_REQUESTS: Status               = Status(429);

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    pub const INTERNAL_SERVER_ERROR: Status           = Status(500);
    pub const NOT_IMPLEMENTED: Status                 = Status(501);
    pub const BAD_GATEWAY: Status                     = Status(502);
    pub const SERVICE_UNAVAILABLE: Status             = Status(503);

    /// The numeric code.
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// The canonical reason phrase, or `""` for unregistered codes.
    pub fn reason(self) -> &'static str {
        status_reason(self.0)
    }

    pub fn is_invalid(self) -> bool {
        !(100..600).contains(&self.0)
    }

    pub fn is_informational(self) -> bool {
        (100..200).contains(&self.0)
    }

    pub fn is_successful(self) -> bool {
        (200..300).contains(&self.0)
    }

    /// `301`, `302`, `303` and `307` only.
    pub fn is_redirect(self) -> bool {
        matches!(self.0, 301 | 302 | 303 | 307)
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.0)
    }

    pub fn is_ok(self) -> bool {
        self.0 == 200
    }

    pub fn is_forbidden(self) -> bool {
        self.0 == 403
    }

    pub fn is_not_found(self) -> bool {
        self.0 == 404
    }

    pub fn is_not_modified(self) -> bool {
        self.0 == 304
    }

    /// `204 No Content`.
    pub fn is_empty(self) -> bool {
        self.0 == 204
    }
}

impl Default for Status {
    fn default() -> Self { Self::OK }
}

impl From<u16> for Status {
    fn from(code: u16) -> Self { Self(code) }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 { s.0 }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            ""     => write!(f, "{}", self.0),
            reason => write!(f, "{} {reason}", self.0),
        }
    }
}

// ── Reason phrases ────────────────────────────────────────────────────────────

fn status_reason(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Content Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        418 => "I'm a Teapot",
        422 => "Unprocessable Content",
        429 => "Too Many Requests",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _   => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert!(Status::CONTINUE.is_informational());
        assert!(Status::NO_CONTENT.is_successful());
        assert!(Status::FOUND.is_redirect());
        assert!(Status::METHOD_NOT_ALLOWED.is_client_error());
        assert!(Status::BAD_GATEWAY.is_server_error());
        assert!(Status::from(99_u16).is_invalid());
        assert!(Status::from(600_u16).is_invalid());
        assert!(!Status::OK.is_invalid());
    }

    #[test]
    fn redirect_and_empty_are_narrow() {
        for code in [301_u16, 302, 303, 307] {
            assert!(Status::from(code).is_redirect(), "{code}");
        }
        assert!(!Status::from(300_u16).is_redirect());
        assert!(!Status::NOT_MODIFIED.is_redirect());
        assert!(!Status::PERMANENT_REDIRECT.is_redirect());

        assert!(Status::NO_CONTENT.is_empty());
        assert!(!Status::CREATED.is_empty());
        assert!(!Status::NOT_MODIFIED.is_empty());
    }

    #[test]
    fn display_includes_reason_when_known() {
        assert_eq!(Status::NOT_FOUND.to_string(), "404 Not Found");
        assert_eq!(Status::from(599_u16).to_string(), "599");
    }
}
