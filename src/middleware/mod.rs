//! Middleware layers.
//!
//! A [`Middleware`] binds one [`CallableRef`] to the arguments it was
//! registered with. The [`Onion`] holds an ordered queue of them and peels
//! them one at a time, handing each a [`Next`] continuation that decides
//! whether the rest of the queue runs at all.
//!
//! ```rust
//! use serve::{from_fn, Onion, Request, Response};
//!
//! let mut onion = Onion::new(Request::new("GET", "/"), Response::new());
//!
//! onion.add_layer(from_fn(|req, res, next, _| {
//!     res.set_header("x-frame-options", "DENY");
//!     next.run(req, res)
//! }), (), false).unwrap();
//!
//! onion.add_layer(from_fn(|_, res, _next, args| {
//!     res.set_text(args.str(0).unwrap_or_default());
//!     Ok(())
//! }), "hello", false).unwrap();
//!
//! onion.peel().unwrap();
//! assert_eq!(onion.peeled().body(), b"hello");
//! ```

mod onion;

use std::fmt;

pub use onion::{Next, Onion, State};

use crate::callback::{Args, CallableRef};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// One unit of work in the onion: a callback plus its bound arguments.
///
/// Created when a route matches (or when a layer is added directly) and
/// consumed by the single peel that executes it.
#[derive(Clone)]
pub struct Middleware {
    callback: CallableRef,
    args: Args,
}

impl Middleware {
    pub fn new(callback: impl Into<CallableRef>, args: impl Into<Args>) -> Self {
        Self { callback: callback.into(), args: args.into() }
    }

    pub fn callback(&self) -> &CallableRef { &self.callback }
    pub fn args(&self) -> &Args { &self.args }

    /// Invokes the callback with `request`, `response` and `next` in front of
    /// the bound arguments.
    ///
    /// A `Class@method` reference is the exception: the bound arguments go
    /// to the constructor, the method runs with nothing, and `next` is
    /// dropped unused. Errors from the callback, or from resolving its name,
    /// are returned unchanged.
    pub fn execute(&self, request: &mut Request, response: &mut Response, next: Next<'_>) -> Result<(), Error> {
        match &self.callback {
            CallableRef::Direct(f) => f(request, response, next, &self.args),
            CallableRef::Static { class, method } => {
                let f = next.callables().static_callback(class, method)?;
                f(request, response, next, &self.args)
            }
            CallableRef::Constructed { class, method } => {
                let mut instance = next.callables().construct(class, &self.args)?;
                drop(next);
                instance.call(method).unwrap_or_else(|| Err(Error::UnknownMethod {
                    class: class.clone(),
                    method: method.clone(),
                }))
            }
        }
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware")
            .field("callback", &format_args!("{}", self.callback))
            .field("args", &self.args)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::callback::{Callables, Controller};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records the constructor args and later the method call.
    struct Recorder {
        log: Log,
        value: String,
    }

    impl Controller for Recorder {
        fn call(&mut self, method: &str) -> Option<Result<(), Error>> {
            match method {
                "normal_method" => {
                    self.log.lock().unwrap().push(self.value.clone());
                    Some(Ok(()))
                }
                _ => None,
            }
        }
    }

    fn run(layer: Middleware, callables: Callables) -> Result<Response, Error> {
        let mut onion = Onion::with_callables(Request::new("GET", "/"), Response::new(), Arc::new(callables));
        onion.add_layer(layer.callback().clone(), layer.args().clone(), false)?;
        onion.peel()?;
        Ok(onion.into_parts().1)
    }

    #[test]
    fn constructed_reference_gets_args_in_constructor() {
        let log = Log::default();
        let ctor_log = Arc::clone(&log);
        let callables = Callables::new().class("Recorder", move |args| {
            assert_eq!(args.len(), 2);
            Ok(Recorder {
                log: Arc::clone(&ctor_log),
                value: format!("{}{}", args.str(0).unwrap_or_default(), args.str(1).unwrap_or_default()),
            })
        });

        run(Middleware::new("tests/Recorder@normal_method", ["foo", "bar"]), callables).unwrap();
        assert_eq!(*log.lock().unwrap(), ["foobar"]);
    }

    #[test]
    fn constructed_reference_with_unknown_method_fails() {
        let callables = Callables::new().class("Recorder", |_| Ok(Recorder { log: Log::default(), value: String::new() }));
        let err = run(Middleware::new("Recorder@missing", ()), callables).unwrap_err();
        assert!(matches!(err, Error::UnknownMethod { ref method, .. } if method == "missing"));
    }

    #[test]
    fn static_reference_gets_request_response_and_args() {
        let callables = Callables::new().static_method("Callback", "static_func", |req, res, _next, args| {
            res.set_text(format!("{} {}{}", req.method(), args.str(0).unwrap_or_default(), args.str(1).unwrap_or_default()));
            Ok(())
        });

        let res = run(Middleware::new("Callback::static_func", ["foo", "bar"]), callables).unwrap();
        assert_eq!(res.body(), b"GET foobar");
    }

    #[test]
    fn closure_gets_bound_args_after_next() {
        let layer = Middleware::new(from_fn_text(), ["foo", "bar"]);
        let res = run(layer, Callables::new()).unwrap();
        assert_eq!(res.body(), b"foo");
    }

    fn from_fn_text() -> CallableRef {
        crate::callback::from_fn(|_, res, _, args| {
            res.set_text(args.str(0).unwrap_or_default());
            Ok(())
        })
    }

    #[test]
    fn unresolvable_reference_propagates() {
        let err = run(Middleware::new("Nope::nothing", ()), Callables::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownClass(ref c) if c == "Nope"));
    }

    #[test]
    fn accessors_expose_callback_and_args() {
        let layer = Middleware::new("Callback::static_func", ["foo", "bar"]);
        assert_eq!(layer.callback().to_string(), "Callback::static_func");
        assert_eq!((layer.args().str(0), layer.args().str(1)), (Some("foo"), Some("bar")));

        let layer = Middleware::new("Callback::static_func", "foo");
        assert_eq!(layer.args().len(), 1);
        assert_eq!(format!("{layer:?}"), r#"Middleware { callback: Callback::static_func, args: ["foo"] }"#);
    }
}
