//! The demonstration application served by the CLI.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use switchyard::{
    from_fn, FormBody, HandlerError, JsonBody, Method, RequestLogger, RequireAuth, Response,
    Router, StaticFiles, StaticFilesConfig,
};

const USERS: &[&str] = &["phil", "ada", "grace"];

/// Builds the demo route table.
///
/// ```text
/// *        (logger, json body, form body)
/// *        /public/*                   static files
/// GET      /public/version
/// GET      /
/// GET      /users
/// POST     /users
/// GET      /users/:username
/// GET      /users/admin/settings       (requires credentials)
/// GET      /posts/:postId/comments/:commentId
/// ```
pub fn build_router(static_files: StaticFilesConfig) -> switchyard::Result<Router> {
    let mut public = Router::new();
    public.get(
        "/version",
        from_fn("version", |ctx, _next| {
            ctx.send(Response::text(env!("CARGO_PKG_VERSION")))
        }),
    )?;

    let mut users = Router::new();
    users
        .get("/", from_fn("list-users", |ctx, _next| {
            ctx.send(Response::json(&USERS)?)
        }))?
        .post("/", from_fn("create-user", |ctx, _next| {
            let username = ctx
                .body
                .as_json()
                .and_then(|v| v.get("username"))
                .and_then(|v| v.as_str())
                .or_else(|| {
                    ctx.body
                        .as_form()
                        .and_then(|f| f.get("username"))
                        .map(String::as_str)
                })
                .ok_or_else(|| HandlerError::msg("username missing from body"))?
                .to_string();
            ctx.send(Response::json(&json!({ "username": username }))?.status(201))
        }))?
        .get("/:username", from_fn("show-user", |ctx, next| {
            let username = ctx.params.require("username").map_err(HandlerError::Message)?;
            if !USERS.iter().any(|u| *u == username) {
                return Ok(next.proceed());
            }
            let body = json!({ "username": username });
            ctx.send(Response::json(&body)?)
        }))?;

    let mut admin = Router::new();
    admin.middleware(RequireAuth::new("/login"));
    admin.get("/settings", from_fn("settings", |ctx, _next| {
        ctx.send(Response::json(&json!({ "theme": "dark" }))?)
    }))?;

    let mut posts = Router::new();
    posts.register_named(
        "comment",
        Method::Get,
        "/:postId/comments/:commentId",
        vec![Arc::new(from_fn("show-comment", |ctx, _next| {
            let params: HashMap<&str, &str> = ctx.params.iter().collect();
            let body = serde_json::to_value(params)?;
            ctx.send(Response::json(&body)?)
        }))],
    )?;

    let mut app = Router::new();
    app.middleware(RequestLogger)
        .middleware(JsonBody)
        .middleware(FormBody);
    app.middleware_at("/public", StaticFiles::with_config(static_files))?
        .mount("/public", public)?
        .get("/", from_fn("home", |ctx, _next| {
            ctx.send(Response::html("<h1>switchyard</h1>"))
        }))?
        .mount("/users", users)?
        .mount("/users/admin", admin)?
        .mount("/posts", posts)?;

    Ok(app)
}
