//! HTTP server and graceful shutdown.
//!
//! Every request gets its own [`Onion`]: global layers are queued first, the
//! router appends whatever matched, and the onion is peeled to completion.
//! Routing failures are turned into `404` / `405` responses here, any other
//! error into a logged `500`.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or Ctrl-C the server stops accepting connections, lets
//! every in-flight connection finish, and then returns from
//! [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::callback::{Args, CallableRef, Callables};
use crate::error::Error;
use crate::middleware::{Middleware, Onion};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    callables: Callables,
    layers: Vec<Middleware>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use serve::Server;
    /// let server = Server::bind("0.0.0.0:3000").unwrap();
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self {
            addr: addr.parse()?,
            callables: Callables::new(),
            layers: Vec::new(),
        })
    }

    /// Registry used to resolve `Class@method` and `Class::method` callbacks.
    pub fn callables(mut self, callables: Callables) -> Self {
        self.callables = callables;
        self
    }

    /// Adds a layer that runs on every request, ahead of the route layers.
    pub fn layer(mut self, callback: impl Into<CallableRef>, args: impl Into<Args>) -> Self {
        self.layers.push(Middleware::new(callback, args));
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        let app = Arc::new(App {
            router,
            callables: Arc::new(self.callables),
            layers: self.layers,
        });

        info!(addr = %self.addr, routes = app.router.routes().len(), "serve listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown is checked first so a SIGTERM stops accepting new
                // connections even if more are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { serve_request(&app, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("serve stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Everything shared by all connections: read-only after startup.
pub(crate) struct App {
    pub(crate) router: Router,
    pub(crate) callables: Arc<Callables>,
    pub(crate) layers: Vec<Middleware>,
}

async fn serve_request(
    app: &App,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("failed to read request body: {e}");
            return Ok(Response::with_status(Status::BAD_REQUEST).into_inner());
        }
    };

    Ok(handle(app, Request::from_parts(&parts, body)).into_inner())
}

/// Routes and peels one request. Never fails: errors become responses.
pub(crate) fn handle(app: &App, request: Request) -> Response {
    let mut onion = Onion::with_callables(request, Response::new(), Arc::clone(&app.callables));

    let result = run(app, &mut onion);
    let (_, response) = onion.into_parts();
    match result {
        Ok(()) => response,
        Err(e) => error_response(&e, response),
    }
}

fn run(app: &App, onion: &mut Onion) -> Result<(), Error> {
    for layer in &app.layers {
        onion.add_layer(layer.callback().clone(), layer.args().clone(), false)?;
    }
    app.router.dispatch(onion)?;
    onion.peel()
}

/// Turns a failure into a response, keeping the headers layers had already
/// set. Routing failures happen before any layer runs, so they start clean.
fn error_response(e: &Error, mut response: Response) -> Response {
    response.body.clear();
    response.headers.retain(|(k, _)| !k.eq_ignore_ascii_case("content-type"));

    let Some(status) = e.status() else {
        error!(error = %e, "request failed");
        response.set_status(Status::INTERNAL_SERVER_ERROR);
        return response;
    };

    debug!(%status, error = %e, "routing failure");
    response.set_status(status);
    if !e.allowed_methods().is_empty() {
        let allowed = e.allowed_methods().iter().map(|m| m.as_str()).collect::<Vec<_>>().join(",");
        response.set_header("allow", &allowed);
    }
    response.set_text(status.reason());
    response
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. On Windows only Ctrl-C is
/// available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
