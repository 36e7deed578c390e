//! The onion: an ordered chain of middleware peeled one layer at a time.
//!
//! Peeling dequeues the head layer and executes it with a [`Next`]. Calling
//! [`Next::run`] peels the following layer *inside* the current one, so each
//! layer can act both before and after everything beneath it. Not calling it
//! ends the chain right there.
//!
//! ```text
//! peel()
//!  └─ A(req, res, next) ── next.run ──┐
//!                                     └─ B(req, res, next) ── next.run ──┐
//!                                                                        └─ finish: 404 → not_found()
//! ```
//!
//! # Stack depth
//!
//! Every `next.run` is a direct call, so the native stack grows by a few
//! frames per layer. A few hundred layers are fine on the default 2 MiB
//! thread stack; chains far beyond that need a bigger stack.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use super::Middleware;
use crate::callback::{Args, CallableRef, Callables};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Where the onion is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum State {
    /// Layers may be added.
    #[default]
    Idle,
    /// A layer is executing; adding layers fails with [`Error::Locked`].
    Peeling,
    /// The last peel consumed every layer.
    Peeled,
}

/// The queue of layers and the lock guarding it. Split from [`Onion`] so a
/// [`Next`] can borrow it while the layer holds the request and response.
pub(crate) struct Stack {
    layers: VecDeque<Middleware>,
    state: State,
    callables: Arc<Callables>,
}

impl Stack {
    fn add(&mut self, layer: Middleware, inner: bool) -> Result<(), Error> {
        if self.state == State::Peeling {
            return Err(Error::Locked);
        }
        if inner {
            self.layers.push_front(layer);
        } else {
            self.layers.push_back(layer);
        }
        self.state = State::Idle;
        Ok(())
    }

    fn peel_layer(&mut self, request: &mut Request, response: &mut Response) -> Result<(), Error> {
        let Some(layer) = self.layers.pop_front() else {
            return Ok(());
        };
        trace!(callback = %layer.callback(), remaining = self.layers.len(), "peeling layer");

        // Restored rather than cleared: an outer layer is still running when
        // a nested one returns.
        let previous = std::mem::replace(&mut self.state, State::Peeling);
        let result = layer.execute(request, response, Next { stack: &mut *self });
        self.state = previous;
        result
    }
}

// ── Next ─────────────────────────────────────────────────────────────────────

/// The continuation handed to each layer.
///
/// Consumed by [`run`](Next::run), so a layer can continue the chain at most
/// once. Dropping it without running ends the chain.
pub struct Next<'a> {
    stack: &'a mut Stack,
}

impl Next<'_> {
    /// Peels the next layer, or finishes the chain if none are left.
    ///
    /// Finishing inspects the response: if its status is `404`, the
    /// response's not-found handling runs and its [`Error::NotFound`] is
    /// returned.
    pub fn run(self, request: &mut Request, response: &mut Response) -> Result<(), Error> {
        if self.stack.layers.is_empty() {
            return finish(request, response);
        }
        self.stack.peel_layer(request, response)
    }

    /// Layers still queued behind this one.
    pub fn remaining(&self) -> usize {
        self.stack.layers.len()
    }

    /// Always returns [`Error::Locked`]: a `Next` only exists while the
    /// onion is being peeled, and a peeling onion accepts no new layers.
    ///
    /// It never queues anything. Layers are registered on the [`Onion`]
    /// before calling [`Onion::peel`]; a layer that needs the rest of the
    /// chain to change must dispatch into a separate onion instead.
    pub fn add_layer(
        &mut self,
        callback: impl Into<CallableRef>,
        args: impl Into<Args>,
        inner: bool,
    ) -> Result<(), Error> {
        self.stack.add(Middleware::new(callback, args), inner)
    }

    pub(crate) fn callables(&self) -> Arc<Callables> {
        Arc::clone(&self.stack.callables)
    }
}

fn finish(request: &Request, response: &mut Response) -> Result<(), Error> {
    if response.status().is_not_found() {
        return response.not_found(format!("{}: {}", request.method(), request.path()));
    }
    Ok(())
}

// ── Onion ────────────────────────────────────────────────────────────────────

/// Chain-of-responsibility executor for one request.
///
/// Owns the request and response for the lifetime of the dispatch and lends
/// both to each layer in turn.
pub struct Onion {
    stack: Stack,
    request: Request,
    response: Response,
}

impl Onion {
    pub fn new(request: Request, response: Response) -> Self {
        Self::with_callables(request, response, Arc::default())
    }

    /// Like [`Onion::new`], resolving string callbacks through `callables`.
    pub fn with_callables(request: Request, response: Response, callables: Arc<Callables>) -> Self {
        Self {
            stack: Stack { layers: VecDeque::new(), state: State::Idle, callables },
            request,
            response,
        }
    }

    /// Adds a layer at the tail of the queue, or at the head when `inner` is
    /// set so it runs before every layer already queued.
    ///
    /// # Errors
    ///
    /// [`Error::Locked`] while the onion is being peeled.
    pub fn add_layer(
        &mut self,
        callback: impl Into<CallableRef>,
        args: impl Into<Args>,
        inner: bool,
    ) -> Result<(), Error> {
        self.stack.add(Middleware::new(callback, args), inner)
    }

    /// Starts unwinding from the head layer.
    ///
    /// Returns once the head layer returns, which is after the whole chain
    /// beneath it has run. Errors from any layer are returned unchanged.
    pub fn peel(&mut self) -> Result<(), Error> {
        let result = self.stack.peel_layer(&mut self.request, &mut self.response);
        if result.is_ok() && self.stack.layers.is_empty() {
            self.stack.state = State::Peeled;
        }
        result
    }

    /// The response, as left by the layers.
    pub fn peeled(&self) -> &Response { &self.response }

    /// The layers not yet consumed.
    pub fn layers(&self) -> &VecDeque<Middleware> { &self.stack.layers }

    pub fn state(&self) -> State { self.stack.state }
    pub fn request(&self) -> &Request { &self.request }

    pub fn into_parts(self) -> (Request, Response) {
        (self.request, self.response)
    }
}
