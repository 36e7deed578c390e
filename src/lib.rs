//! # serve
//!
//! Request dispatch for HTTP services: a pattern [`Router`] feeding an
//! [`Onion`] of middleware.
//!
//! ## How a request flows
//!
//! 1. The router matches the request path and method against every
//!    registration and appends each fitting callback to the onion as a layer.
//! 2. The onion is peeled: the first layer runs with a [`Next`]
//!    continuation, and decides whether the rest of the chain runs at all.
//! 3. Routing failures come back as [`Error::NotFound`] or
//!    [`Error::MethodNotAllowed`], which the [`Server`] turns into `404` /
//!    `405` responses.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serve::{from_fn, Args, Error, Next, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let app = Router::new()
//!         .get("/users/:num", from_fn(show_user), ())
//!         .post("/users",     from_fn(create_user), ());
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! fn show_user(req: &mut Request, res: &mut Response, next: Next<'_>, _: &Args) -> Result<(), Error> {
//!     let id = req.path().rsplit('/').next().unwrap_or_default();
//!     res.set_json(format!(r#"{{"id":{id}}}"#).into_bytes());
//!     next.run(req, res)
//! }
//!
//! fn create_user(req: &mut Request, res: &mut Response, _next: Next<'_>, _: &Args) -> Result<(), Error> {
//!     res.set_status(if req.body().is_empty() { 400_u16 } else { 201 });
//!     Ok(())
//! }
//! ```
//!
//! ## Callbacks by name
//!
//! Routes can also name their callback: `"UserController@show"` constructs a
//! registered [`Controller`], `"Auth::check"` calls a registered static
//! method. Both are resolved through the [`Callables`] registry handed to the
//! server (or to [`Onion::with_callables`]).

mod callback;
mod error;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod health;
pub mod middleware;

pub use callback::{from_fn, Args, Callables, CallableRef, Callback, Controller};
pub use error::{BoxError, Error};
pub use method::Method;
pub use middleware::{Middleware, Next, Onion, State};
pub use request::Request;
pub use response::{ContentType, Response};
pub use router::{Route, Router};
pub use server::Server;
pub use status::Status;
