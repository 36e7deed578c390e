//! Minimal serve example: placeholder routes, a global layer, a named
//! controller and health checks.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -X PUT http://localhost:3000/users        # 405, allow: POST
//!   curl http://localhost:3000/archive/2024/02
//!   curl http://localhost:3000/healthz

use serve::{
    from_fn, health, Args, Callables, Controller, Error, Next, Request, Response, Router, Server,
    Status,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let callables = Callables::new()
        .class("ArchiveController", |args| Ok(ArchiveController {
            section: args.str(0).unwrap_or("posts").to_owned(),
        }));

    let app = Router::new()
        .get("/users/:num",            from_fn(get_user), ())
        .post("/users",                from_fn(create_user), ())
        .delete("/users/:num",         from_fn(delete_user), ())
        .get("/archive/:year/:month",  "controllers/ArchiveController@index", "articles")
        .get("/healthz",               from_fn(health::liveness), ())
        .get("/readyz",                from_fn(health::readiness), ());

    Server::bind("0.0.0.0:3000")?
        .callables(callables)
        .layer(from_fn(security_headers), ())
        .serve(app)
        .await
}

// Runs on every request before the route layers.
fn security_headers(req: &mut Request, res: &mut Response, next: Next<'_>, _: &Args) -> Result<(), Error> {
    res.set_header("x-content-type-options", "nosniff");
    res.set_header("x-frame-options", "DENY");
    next.run(req, res)
}

// GET /users/:num
fn get_user(req: &mut Request, res: &mut Response, next: Next<'_>, _: &Args) -> Result<(), Error> {
    let id = req.path().rsplit('/').next().unwrap_or_default();
    res.set_json(format!(r#"{{"id":{id},"name":"alice"}}"#).into_bytes());
    next.run(req, res)
}

// POST /users
//
// req.body() is &[u8]; parse it with whatever serialiser you like.
fn create_user(req: &mut Request, res: &mut Response, next: Next<'_>, _: &Args) -> Result<(), Error> {
    if req.body().is_empty() {
        res.set_status(Status::BAD_REQUEST);
        return Ok(());
    }

    res.set_status(Status::CREATED);
    res.set_header("location", "/users/99");
    res.set_json(br#"{"id":99,"name":"new_user"}"#.to_vec());
    next.run(req, res)
}

// DELETE /users/:num → 204 No Content
fn delete_user(req: &mut Request, res: &mut Response, next: Next<'_>, _: &Args) -> Result<(), Error> {
    res.set_status(Status::NO_CONTENT);
    next.run(req, res)
}

// GET /archive/:year/:month
//
// Built from the route's bound args; never sees the request.
struct ArchiveController {
    section: String,
}

impl Controller for ArchiveController {
    fn call(&mut self, method: &str) -> Option<Result<(), Error>> {
        match method {
            "index" => {
                tracing::info!(section = %self.section, "archive index rendered");
                Some(Ok(()))
            }
            _ => None,
        }
    }
}
