//! Pattern router.
//!
//! Routes are kept in one ordered list, in registration order. Dispatching a
//! request does not pick *a* handler: it collects **every** registration
//! whose pattern and method fit and appends them to the [`Onion`] as layers,
//! in the order they were registered.
//!
//! # Patterns
//!
//! A pattern is a path with its leading and trailing slashes trimmed. It may
//! contain placeholder tokens, each standing for a fixed regular expression:
//!
//! | Token | Matches |
//! |---|---|
//! | `:any` | `[^/]+` (one segment) |
//! | `:num` | `[0-9]+` |
//! | `:all`, `:category` | `.*` (anything, slashes included) |
//! | `:year` | four digits |
//! | `:month` | `01` to `12` |
//! | `:day` | `01` to `31` |
//! | `:hour`, `:minute`, `:second` | `0?[0-5][0-9]` |
//! | `:postname`, `:author` | `[a-z0-9 -]+` |
//!
//! # Matching
//!
//! 1. If the path equals any pattern literally, only the literally equal
//!    registrations are considered.
//! 2. Otherwise every pattern is tried as an anchored regex, in order.
//!
//! If something matched but nothing for the request's method, dispatch fails
//! with [`Error::MethodNotAllowed`] naming the method of the **last** matching
//! registration. If nothing matched at all, dispatch fails with
//! [`Error::NotFound`], unless the router was built with
//! [`throw_not_found(false)`](Router::throw_not_found).

use std::fmt;

use regex::Regex;
use tracing::{debug, warn};

use crate::callback::{Args, CallableRef};
use crate::error::Error;
use crate::method::Method;
use crate::middleware::Onion;

/// Placeholder tokens and the expression each one stands for.
const PLACEHOLDERS: [(&str, &str); 12] = [
    (":any",      "[^/]+"),
    (":num",      "[0-9]+"),
    (":all",      ".*"),
    (":year",     "[0-9]{4}"),
    (":month",    "0[1-9]|1[012]"),
    (":day",      "0[1-9]|[12][0-9]|3[01]"),
    (":hour",     "0?[0-5][0-9]"),
    (":minute",   "0?[0-5][0-9]"),
    (":second",   "0?[0-5][0-9]"),
    (":postname", "[a-z0-9 -]+"),
    (":category", ".*"),
    (":author",   "[a-z0-9 -]+"),
];

/// Compiles a trimmed pattern into an anchored regex.
///
/// Each placeholder becomes a non-capturing group so alternations stay inside
/// their segment. `None` if the result is not a valid expression.
fn compile(pattern: &str) -> Option<Regex> {
    let mut source = pattern.to_owned();
    if source.contains(':') {
        for (token, fragment) in PLACEHOLDERS {
            source = source.replace(token, &format!("(?:{fragment})"));
        }
    }

    match Regex::new(&format!("^{source}$")) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(pattern, error = %e, "route pattern is not a valid expression, it will only match literally");
            None
        }
    }
}

// ── Route ────────────────────────────────────────────────────────────────────

/// One registration: a method, a trimmed pattern, and what to run.
#[derive(Clone)]
pub struct Route {
    pattern: String,
    method: Method,
    callback: CallableRef,
    args: Args,
    regex: Option<Regex>,
}

impl Route {
    fn new(method: Method, uri: &str, callback: CallableRef, args: Args) -> Self {
        let pattern = uri.trim_matches('/').to_owned();
        let regex = compile(&pattern);
        Self { pattern, method, callback, args, regex }
    }

    pub fn pattern(&self) -> &str { &self.pattern }
    pub fn method(&self) -> Method { self.method }
    pub fn callback(&self) -> &CallableRef { &self.callback }
    pub fn args(&self) -> &Args { &self.args }

    /// Structural match: does the pattern match `path`, whatever the method?
    pub fn matches(&self, path: &str) -> bool {
        self.regex.as_ref().is_some_and(|regex| regex.is_match(path))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("callback", &format_args!("{}", self.callback))
            .field("args", &self.args)
            .finish()
    }
}

// ── Router ───────────────────────────────────────────────────────────────────

/// The application router.
///
/// Build it once at startup; it is read-only afterwards and can be shared
/// by every request. Each registration method returns `self` so
/// registrations chain naturally.
///
/// ```rust
/// use serve::{Onion, Request, Response, Router};
///
/// let router = Router::new()
///     .get("/users/:num", "UserController@show", ())
///     .post("/users", "UserController@store", ())
///     .delete("/users/:num", "UserController@destroy", ());
///
/// let mut onion = Onion::new(Request::new("GET", "/users/42"), Response::new());
/// router.dispatch(&mut onion).unwrap();
/// assert_eq!(onion.layers()[0].callback().to_string(), "UserController@show");
/// ```
#[derive(Clone, Debug)]
pub struct Router {
    routes: Vec<Route>,
    throw_not_found: bool,
}

impl Router {
    /// An empty router that fails dispatch with [`Error::NotFound`] when no
    /// route matches.
    pub fn new() -> Self {
        Self { routes: Vec::new(), throw_not_found: true }
    }

    /// Whether an unmatched path is an error. When `false`, dispatch returns
    /// `Ok(())` without queuing anything.
    pub fn throw_not_found(mut self, throw: bool) -> Self {
        self.throw_not_found = throw;
        self
    }

    /// Registers `callback` for `GET` **and** `HEAD` on `uri`.
    pub fn get(self, uri: &str, callback: impl Into<CallableRef>, args: impl Into<Args>) -> Self {
        let (callback, args) = (callback.into(), args.into());
        self.head(uri, callback.clone(), args.clone())
            .on(Method::Get, uri, callback, args)
    }

    pub fn head(self, uri: &str, callback: impl Into<CallableRef>, args: impl Into<Args>) -> Self {
        self.on(Method::Head, uri, callback, args)
    }

    pub fn post(self, uri: &str, callback: impl Into<CallableRef>, args: impl Into<Args>) -> Self {
        self.on(Method::Post, uri, callback, args)
    }

    pub fn put(self, uri: &str, callback: impl Into<CallableRef>, args: impl Into<Args>) -> Self {
        self.on(Method::Put, uri, callback, args)
    }

    pub fn patch(self, uri: &str, callback: impl Into<CallableRef>, args: impl Into<Args>) -> Self {
        self.on(Method::Patch, uri, callback, args)
    }

    pub fn delete(self, uri: &str, callback: impl Into<CallableRef>, args: impl Into<Args>) -> Self {
        self.on(Method::Delete, uri, callback, args)
    }

    pub fn options(self, uri: &str, callback: impl Into<CallableRef>, args: impl Into<Args>) -> Self {
        self.on(Method::Options, uri, callback, args)
    }

    /// Registers exactly one method + pattern pair. Unlike [`Router::get`],
    /// `on(Method::Get, ..)` does not add a `HEAD` route.
    pub fn on(
        mut self,
        method: Method,
        uri: &str,
        callback: impl Into<CallableRef>,
        args: impl Into<Args>,
    ) -> Self {
        self.routes.push(Route::new(method, uri, callback.into(), args.into()));
        self
    }

    /// Every registration, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Matches the onion's request against the routing table and appends the
    /// callback of every fitting registration to the onion.
    ///
    /// # Errors
    ///
    /// - [`Error::MethodNotAllowed`] if the path matched but the method never did.
    /// - [`Error::NotFound`] if nothing matched and the router throws on not-found.
    /// - [`Error::Locked`] if the onion is being peeled.
    pub fn dispatch(&self, onion: &mut Onion) -> Result<(), Error> {
        let method = onion.request().method().to_owned();
        let path = onion.request().path().to_owned();

        let literal = self.routes.iter().any(|route| route.pattern == path);
        let mut allowed = None;
        let mut matched = Vec::new();

        for route in &self.routes {
            let hit = if literal { route.pattern == path } else { route.matches(&path) };
            if !hit {
                continue;
            }
            allowed = Some(route.method);
            if route.method == *method.as_str() {
                matched.push(route);
            }
        }

        match allowed {
            None if self.throw_not_found => Err(Error::NotFound(format!("{method}: {path}"))),
            None => {
                debug!(%method, %path, "no route matched");
                Ok(())
            }
            Some(allowed) if matched.is_empty() => Err(Error::MethodNotAllowed {
                method,
                allowed: vec![allowed],
            }),
            Some(_) => {
                debug!(%method, %path, layers = matched.len(), "route matched");
                for route in matched {
                    onion.add_layer(route.callback.clone(), route.args.clone(), false)?;
                }
                Ok(())
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::request::Request;
    use crate::response::Response;

    fn dispatch(router: &Router, method: &str, uri: &str) -> (Result<(), Error>, Vec<String>) {
        let mut onion = Onion::new(Request::new(method, uri), Response::new());
        let result = router.dispatch(&mut onion);
        let queued = onion.layers().iter().map(|layer| layer.callback().to_string()).collect();
        (result, queued)
    }

    #[rstest]
    #[case("users/:any",      "users/bob",            true)]
    #[case("users/:any",      "users/bob/posts",      false)]
    #[case("users/:num",      "users/42",             true)]
    #[case("users/:num",      "users/4a",             false)]
    #[case("files/:all",      "files/a/b/c.txt",      true)]
    #[case("files/:all",      "files",                false)]
    #[case("archive/:year",   "archive/2024",         true)]
    #[case("archive/:year",   "archive/24",           false)]
    #[case("archive/:month",  "archive/09",           true)]
    #[case("archive/:month",  "archive/12",           true)]
    #[case("archive/:month",  "archive/13",           false)]
    #[case("archive/:month",  "archive/1x12",         false)]
    #[case("archive/:day",    "archive/31",           true)]
    #[case("archive/:day",    "archive/32",           false)]
    #[case("at/:hour",        "at/07",                true)]
    #[case("at/:hour",        "at/60",                false)]
    #[case("at/:minute",      "at/059",               true)]
    #[case("at/:minute",      "at/7x",                false)]
    #[case("at/:second",      "at/45",                true)]
    #[case("at/:second",      "at/99",                false)]
    #[case("blog/:postname",  "blog/hello-world 2",   true)]
    #[case("blog/:postname",  "blog/Hello",           false)]
    #[case("by/:author",      "by/joe",               true)]
    #[case("by/:author",      "by/joe_h",             false)]
    #[case("in/:category",    "in/news/local",        true)]
    #[case(":year/:month/:day/:postname", "2024/02/29/leap-day", true)]
    #[case(":year/:month/:day/:postname", "2024/02/30x/leap-day", false)]
    fn placeholder_tokens(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
        let route = Route::new(Method::Get, pattern, "X@y".into(), Args::new());
        assert_eq!(route.matches(path), expected, "{pattern} vs {path}");
    }

    #[test]
    fn patterns_are_trimmed() {
        let router = Router::new().post("/users/", "Users@store", ());
        assert_eq!(router.routes()[0].pattern(), "users");
    }

    #[test]
    fn get_also_registers_head() {
        let router = Router::new().get("about", "Pages@about", "about-us");
        let routes = router.routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].method(), Method::Head);
        assert_eq!(routes[1].method(), Method::Get);
        for route in routes {
            assert_eq!(route.pattern(), "about");
            assert_eq!(route.callback().to_string(), "Pages@about");
            assert_eq!(route.args().str(0), Some("about-us"));
        }

        let (result, queued) = dispatch(&router, "HEAD", "/about");
        assert!(result.is_ok());
        assert_eq!(queued, ["Pages@about"]);
    }

    #[test]
    fn on_registers_a_single_method() {
        let router = Router::new().on(Method::Get, "raw", "Raw@get", ());
        assert_eq!(router.routes().len(), 1);
    }

    #[test]
    fn literal_match_shadows_placeholders() {
        let router = Router::new()
            .get("users/:any", "Users@show", ())
            .get("users/new", "Users@create", ());

        let (_, queued) = dispatch(&router, "GET", "/users/new");
        assert_eq!(queued, ["Users@create"]);

        let (_, queued) = dispatch(&router, "GET", "/users/7");
        assert_eq!(queued, ["Users@show"]);
    }

    #[test]
    fn every_overlapping_pattern_contributes() {
        let router = Router::new()
            .get(":all", "Log@visit", ())
            .get("posts/:num", "Posts@show", ())
            .post("posts/:num", "Posts@update", ())
            .get("posts/:any", "Posts@fallback", ());

        let (result, queued) = dispatch(&router, "GET", "/posts/3");
        assert!(result.is_ok());
        assert_eq!(queued, ["Log@visit", "Posts@show", "Posts@fallback"]);
    }

    #[test]
    fn placeholder_free_patterns_are_scanned_as_expressions() {
        let router = Router::new().on(Method::Get, "a.c", "Dot@hit", ());

        let (result, queued) = dispatch(&router, "GET", "/abc");
        assert!(result.is_ok());
        assert_eq!(queued, ["Dot@hit"]);

        let (result, queued) = dispatch(&router, "GET", "/abcd");
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(queued.is_empty());
    }

    #[test]
    fn unrelated_path_is_not_found() {
        let router = Router::new()
            .get("about", "Pages@about", ())
            .get("contact", "Pages@contact", ());

        let (result, queued) = dispatch(&router, "GET", "/nowhere");
        assert!(matches!(result, Err(Error::NotFound(ref what)) if what == "GET: nowhere"));
        assert!(queued.is_empty());
    }

    #[test]
    fn method_not_allowed_reports_last_structural_match() {
        let router = Router::new()
            .post("items/:num", "Items@update", ())
            .delete("items/:any", "Items@destroy", ());

        let (result, queued) = dispatch(&router, "PUT", "/items/9");
        let err = result.unwrap_err();
        assert_eq!(err.allowed_methods(), &[Method::Delete]);
        assert!(matches!(err, Error::MethodNotAllowed { ref method, .. } if method == "PUT"));
        assert!(queued.is_empty());
    }

    #[test]
    fn unmatched_path_is_silent_when_configured() {
        let router = Router::new().throw_not_found(false).get("home", "Home@index", ());
        let (result, queued) = dispatch(&router, "GET", "/missing");
        assert!(result.is_ok());
        assert!(queued.is_empty());
    }

    #[test]
    fn invalid_expression_still_matches_literally() {
        let router = Router::new().get("weird(", "Weird@page", ());
        assert!(!router.routes()[0].matches("weird("));

        let (result, queued) = dispatch(&router, "GET", "/weird(");
        assert!(result.is_ok());
        assert_eq!(queued.len(), 1);
    }

    #[test]
    fn site_root_is_the_empty_pattern() {
        let router = Router::new().get("/", "Home@index", ());
        let (result, queued) = dispatch(&router, "GET", "/?utm=x");
        assert!(result.is_ok());
        assert_eq!(queued, ["Home@index"]);
    }
}
