//! Callable references and how they are resolved.
//!
//! A route or middleware layer names *what* to run with a [`CallableRef`].
//! There are three shapes:
//!
//! ```text
//! from_fn(show_user)          → Direct       called as f(req, res, next, args)
//! "admin/UserController@edit" → Constructed  ctor(args), then instance.edit()
//! "Auth::check"               → Static       called as f(req, res, next, args)
//! ```
//!
//! Rust has no runtime reflection, so the string forms are resolved through a
//! [`Callables`] registry the host application fills in at startup. Nothing
//! is looked up until the layer actually runs: an unknown name surfaces as an
//! [`Error::UnknownClass`] / [`Error::UnknownMethod`] from the peel, exactly
//! like any other failure raised by a callback.
//!
//! # The `Class@method` shape
//!
//! A constructed reference hands the layer's bound arguments to the
//! constructor and then calls the named method with **no** arguments. The
//! instance never sees the request, the response or the `next` continuation,
//! so a constructed layer always ends the chain. Use it for terminal
//! controllers whose state is fully determined at construction time.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::middleware::Next;
use crate::request::Request;
use crate::response::Response;

// ── Callback ──────────────────────────────────────────────────────────────────

/// A type-erased callback shared between every request that matches it.
///
/// `Arc` because one registration is turned into a fresh layer per request;
/// cloning the layer only bumps a reference count.
pub type Callback =
    Arc<dyn Fn(&mut Request, &mut Response, Next<'_>, &Args) -> Result<(), Error> + Send + Sync + 'static>;

/// Wraps a function or closure as a [`CallableRef::Direct`].
///
/// ```rust
/// use serve::{from_fn, Args, Error, Next, Request, Response};
///
/// fn hello(req: &mut Request, res: &mut Response, next: Next<'_>, _: &Args) -> Result<(), Error> {
///     res.set_text("hello");
///     next.run(req, res)
/// }
///
/// let callback = from_fn(hello);
/// assert_eq!(callback.to_string(), "<fn>");
/// ```
pub fn from_fn<F>(f: F) -> CallableRef
where
    F: Fn(&mut Request, &mut Response, Next<'_>, &Args) -> Result<(), Error> + Send + Sync + 'static,
{
    CallableRef::Direct(Arc::new(f))
}

// ── CallableRef ───────────────────────────────────────────────────────────────

/// What a layer runs when it is peeled.
#[derive(Clone)]
pub enum CallableRef {
    /// A function or closure, called with `(request, response, next, args)`.
    Direct(Callback),
    /// `"path/to/Class@method"`: construct `Class` from the bound args, then
    /// call `method` with no arguments.
    Constructed { class: String, method: String },
    /// `"Class::method"`: call the registered static method with
    /// `(request, response, next, args)`.
    Static { class: String, method: String },
}

impl CallableRef {
    /// Parses a string reference.
    ///
    /// Anything containing `::` is a static reference. Otherwise everything up
    /// to the last `/` is discarded and the remainder is split on `@`. A string
    /// with no `@` yields an empty method name, which fails when invoked.
    pub fn parse(reference: &str) -> Self {
        if reference.contains("::") {
            let mut segments = reference.split("::");
            return Self::Static {
                class: segments.next().unwrap_or_default().to_owned(),
                method: segments.next().unwrap_or_default().to_owned(),
            };
        }

        let last = reference.rsplit('/').next().unwrap_or(reference);
        let mut segments = last.split('@');
        Self::Constructed {
            class: segments.next().unwrap_or_default().to_owned(),
            method: segments.next().unwrap_or_default().to_owned(),
        }
    }
}

impl From<&str> for CallableRef {
    fn from(reference: &str) -> Self { Self::parse(reference) }
}

impl From<String> for CallableRef {
    fn from(reference: String) -> Self { Self::parse(&reference) }
}

impl fmt::Display for CallableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_)                     => f.write_str("<fn>"),
            Self::Constructed { class, method } => write!(f, "{class}@{method}"),
            Self::Static { class, method }      => write!(f, "{class}::{method}"),
        }
    }
}

impl fmt::Debug for CallableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallableRef({self})")
    }
}

// ── Args ──────────────────────────────────────────────────────────────────────

/// The arguments bound to a route or layer at registration time.
///
/// Always an ordered sequence: `()` is the empty sequence, a bare string is a
/// one-element sequence, arrays and vectors keep their order. Values of any
/// other type are appended with [`Args::with`] and read back with
/// [`Args::get`].
///
/// ```rust
/// use serve::Args;
///
/// let args = Args::from(["foo", "bar"]).with(42_u32);
/// assert_eq!(args.len(), 3);
/// assert_eq!(args.str(1), Some("bar"));
/// assert_eq!(args.get::<u32>(2), Some(&42));
/// assert!(Args::from(()).is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Args(Vec<Arc<dyn Any + Send + Sync>>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value. Returns `self` for chaining.
    pub fn with(mut self, value: impl Any + Send + Sync) -> Self {
        self.0.push(Arc::new(value));
        self
    }

    /// The argument at `index`, if present and of type `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.0.get(index).and_then(|arg| arg.downcast_ref::<T>())
    }

    /// The string argument at `index`.
    pub fn str(&self, index: usize) -> Option<&str> {
        self.get::<String>(index).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for index in 0..self.len() {
            match self.str(index) {
                Some(s) => list.entry(&s),
                None    => list.entry(&format_args!("_")),
            };
        }
        list.finish()
    }
}

impl From<()> for Args {
    fn from((): ()) -> Self { Self::new() }
}

impl From<&str> for Args {
    fn from(value: &str) -> Self { Self::new().with(value.to_owned()) }
}

impl From<String> for Args {
    fn from(value: String) -> Self { Self::new().with(value) }
}

impl<const N: usize> From<[&str; N]> for Args {
    fn from(values: [&str; N]) -> Self {
        values.into_iter().fold(Self::new(), |args, v| args.with(v.to_owned()))
    }
}

impl From<Vec<String>> for Args {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().fold(Self::new(), |args, v| args.with(v))
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// An instance built for a `Class@method` reference.
///
/// Implementations dispatch on the method name themselves:
///
/// ```rust
/// use serve::{Controller, Error};
///
/// struct Greeter { name: String }
///
/// impl Controller for Greeter {
///     fn call(&mut self, method: &str) -> Option<Result<(), Error>> {
///         match method {
///             "greet" => {
///                 println!("hello {}", self.name);
///                 Some(Ok(()))
///             }
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Controller: Send {
    /// Runs `method`. Returns `None` when the instance has no such method.
    fn call(&mut self, method: &str) -> Option<Result<(), Error>>;
}

type Factory = Arc<dyn Fn(&Args) -> Result<Box<dyn Controller>, Error> + Send + Sync + 'static>;

// ── Callables ─────────────────────────────────────────────────────────────────

/// Registry that resolves string callable references.
///
/// Filled in once at startup and shared read-only by every request.
///
/// ```rust
/// use serve::{Callables, Controller, Error};
///
/// struct Home;
///
/// impl Controller for Home {
///     fn call(&mut self, method: &str) -> Option<Result<(), Error>> {
///         (method == "index").then_some(Ok(()))
///     }
/// }
///
/// let callables = Callables::new()
///     .class("Home", |_args| Ok(Home))
///     .static_method("Auth", "check", |req, res, next, _args| next.run(req, res));
/// ```
#[derive(Clone, Default)]
pub struct Callables {
    classes: HashMap<String, Factory>,
    statics: HashMap<String, HashMap<String, Callback>>,
}

impl Callables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor for `Class@method` references.
    pub fn class<T, F>(mut self, name: &str, construct: F) -> Self
    where
        T: Controller + 'static,
        F: Fn(&Args) -> Result<T, Error> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |args| {
            construct(args).map(|instance| Box::new(instance) as Box<dyn Controller>)
        });
        self.classes.insert(name.to_owned(), factory);
        self
    }

    /// Registers the target of a `Class::method` reference.
    pub fn static_method<F>(mut self, class: &str, method: &str, f: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, Next<'_>, &Args) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.statics
            .entry(class.to_owned())
            .or_default()
            .insert(method.to_owned(), Arc::new(f));
        self
    }

    pub(crate) fn construct(&self, class: &str, args: &Args) -> Result<Box<dyn Controller>, Error> {
        let factory = self.classes.get(class)
            .ok_or_else(|| Error::UnknownClass(class.to_owned()))?;
        factory(args)
    }

    pub(crate) fn static_callback(&self, class: &str, method: &str) -> Result<Callback, Error> {
        let methods = self.statics.get(class)
            .ok_or_else(|| Error::UnknownClass(class.to_owned()))?;
        methods.get(method).map(Arc::clone).ok_or_else(|| Error::UnknownMethod {
            class: class.to_owned(),
            method: method.to_owned(),
        })
    }
}

impl fmt::Debug for Callables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callables")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .finish()
    }
}
