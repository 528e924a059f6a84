//! Static files coexisting with dynamic routes at the same mount point.

mod common;
use common::*;

use std::fs;

use switchyard::{Dispatcher, Method, Outcome, RawRequest, Router, StaticFiles};
use tempfile::TempDir;

fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("css/site.css"), "body{}").unwrap();
    fs::write(dir.path().join("docs/index.html"), "<h1>docs</h1>").unwrap();
    fs::write(dir.path().join(".secret"), "token").unwrap();
    dir
}

fn app(root: &std::path::Path, trace: &Trace) -> Dispatcher {
    let mut assets = Router::new();
    assets
        .register(Method::Get, "/version", vec![trace.reply("version")])
        .unwrap();

    let mut router = Router::new();
    router
        .middleware_at("/assets", StaticFiles::new(root))
        .unwrap()
        .mount("/assets", assets)
        .unwrap();
    Dispatcher::new(router)
}

#[tokio::test]
async fn serves_existing_file() {
    let dir = site();
    let trace = Trace::default();
    let outcome = app(dir.path(), &trace)
        .dispatch(RawRequest::get("/assets/css/site.css"))
        .await;

    let Outcome::Sent(response) = outcome else {
        panic!("expected a file");
    };
    assert_eq!(response.get_header("Content-Type"), Some("text/css"));
    assert_eq!(response.body, b"body{}");
    assert!(trace.calls().is_empty());
}

#[tokio::test]
async fn serves_directory_index() {
    let dir = site();
    let trace = Trace::default();
    let outcome = app(dir.path(), &trace)
        .dispatch(RawRequest::get("/assets/docs/"))
        .await;
    assert_eq!(body(&outcome), "<h1>docs</h1>");
}

#[tokio::test]
async fn missing_file_falls_through_to_route() {
    let dir = site();
    let trace = Trace::default();
    let outcome = app(dir.path(), &trace)
        .dispatch(RawRequest::get("/assets/version"))
        .await;
    assert_eq!(body(&outcome), "version");
    assert_eq!(trace.calls(), ["version"]);
}

#[tokio::test]
async fn missing_file_without_route_is_not_found() {
    let dir = site();
    let trace = Trace::default();
    let outcome = app(dir.path(), &trace)
        .dispatch(RawRequest::get("/assets/missing.js"))
        .await;
    assert!(matches!(outcome, Outcome::NotFound(_)));
}

#[tokio::test]
async fn hidden_and_escaping_paths_are_not_served() {
    let dir = site();
    let trace = Trace::default();
    let dispatcher = app(dir.path(), &trace);

    for target in ["/assets/.secret", "/assets/../Cargo.toml", "/assets/%2e%2e/x"] {
        let outcome = dispatcher.dispatch(RawRequest::get(target)).await;
        assert!(matches!(outcome, Outcome::NotFound(_)), "{target}");
    }
}

#[tokio::test]
async fn head_omits_body() {
    let dir = site();
    let trace = Trace::default();
    let outcome = app(dir.path(), &trace)
        .dispatch(RawRequest::new("HEAD", "/assets/css/site.css"))
        .await;
    let response = outcome.into_response().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.get_header("Content-Length"), Some("6"));
    assert!(response.body.is_empty());
}
