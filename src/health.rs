//! Built-in health-check callbacks.
//!
//! | Probe | Question |
//! |---|---|
//! | [`liveness`] | Is the process alive? Failure → restart. |
//! | [`readiness`] | Can the process serve traffic? Failure → pulled from the load balancer. |
//!
//! Register them like any other route:
//!
//! ```rust
//! use serve::{from_fn, health, Router};
//!
//! let app = Router::new()
//!     .get("/healthz", from_fn(health::liveness), ())
//!     .get("/readyz", from_fn(health::readiness), ());
//! ```

use crate::{Args, Error, Next, Request, Response};

/// Liveness probe. Answers `200 OK` with body `"ok"` and ends the chain.
///
/// If the process can respond to HTTP at all it is alive, so this has no
/// dependencies.
pub fn liveness(_req: &mut Request, res: &mut Response, _next: Next<'_>, _args: &Args) -> Result<(), Error> {
    res.set_text("ok");
    Ok(())
}

/// Readiness probe (default implementation). Answers `200 OK` with body
/// `"ready"` and ends the chain.
///
/// Replace it with your own callback if the application must warm up or
/// check its dependencies before taking traffic.
pub fn readiness(_req: &mut Request, res: &mut Response, _next: Next<'_>, _args: &Args) -> Result<(), Error> {
    res.set_text("ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_fn, Onion, Router, Status};

    #[test]
    fn probes_answer_on_get_and_head() {
        let router = Router::new()
            .get("/healthz", from_fn(liveness), ())
            .get("/readyz", from_fn(readiness), ());

        for (method, uri, body) in [("GET", "/healthz", "ok"), ("HEAD", "/readyz", "ready")] {
            let mut onion = Onion::new(Request::new(method, uri), Response::new());
            router.dispatch(&mut onion).unwrap();
            onion.peel().unwrap();
            assert_eq!(onion.peeled().status(), Status::OK);
            assert_eq!(onion.peeled().body(), body.as_bytes());
        }
    }
}
