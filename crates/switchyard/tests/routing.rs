//! Route matching through the dispatcher.

mod common;
use common::*;

use switchyard::{Method, Outcome, Router};

#[tokio::test]
async fn single_param_captures_one_segment() {
    for segment in ["s", "phil", "42", "with-dash", "a.b", "%7Euser"] {
        let mut router = Router::new();
        router
            .register(Method::Get, "/base/:x", vec![echo_params()])
            .unwrap();
        let outcome = get(router, &format!("/base/{segment}")).await;
        assert!(matches!(outcome, Outcome::Sent(_)), "{segment}");
        let expected = urlencoding::decode(segment).unwrap();
        assert_eq!(body(&outcome), format!("x={expected}"));
    }
}

#[tokio::test]
async fn single_param_rejects_extra_segments() {
    let mut router = Router::new();
    router
        .register(Method::Get, "/base/:x", vec![echo_params()])
        .unwrap();
    let outcome = get(router, "/base/s/extra").await;
    assert!(matches!(outcome, Outcome::NotFound(_)));
    assert_eq!(outcome.status(), Some(404));
}

#[tokio::test]
async fn first_registration_wins() {
    let trace = Trace::default();
    let mut router = Router::new();
    router
        .register(Method::Get, "/items/:id", vec![trace.reply("first")])
        .unwrap()
        .register(Method::Get, "/items/:id", vec![trace.reply("second")])
        .unwrap();

    let dispatcher = switchyard::Dispatcher::new(router);
    for _ in 0..3 {
        let outcome = dispatcher
            .dispatch(switchyard::RawRequest::get("/items/1"))
            .await;
        assert_eq!(body(&outcome), "first");
    }
    assert_eq!(trace.calls(), ["first", "first", "first"]);
}

#[tokio::test]
async fn specific_route_registered_later_never_overrides() {
    let trace = Trace::default();
    let mut router = Router::new();
    router
        .register(Method::Get, "/users/:name", vec![trace.reply("generic")])
        .unwrap()
        .register(Method::Get, "/users/admin", vec![trace.reply("admin")])
        .unwrap();

    assert_eq!(body(&get(router, "/users/admin").await), "generic");
}

#[tokio::test]
async fn mounted_router_scopes_its_patterns() {
    let mut users = Router::new();
    users
        .register(Method::Get, "/:username", vec![echo_params()])
        .unwrap();
    let mut app = Router::new();
    app.mount("/users", users).unwrap();
    let dispatcher = switchyard::Dispatcher::new(app);

    let hit = dispatcher
        .dispatch(switchyard::RawRequest::get("/users/phil"))
        .await;
    assert_eq!(body(&hit), "username=phil");

    let miss = dispatcher
        .dispatch(switchyard::RawRequest::get("/phil"))
        .await;
    assert!(matches!(miss, Outcome::NotFound(_)));
}

#[tokio::test]
async fn overlapping_mounts_fall_through() {
    let trace = Trace::default();

    let mut users = Router::new();
    users
        .register(Method::Get, "/:username", vec![trace.reply("profile")])
        .unwrap();

    let mut admin = Router::new();
    admin
        .register(Method::Get, "/settings", vec![trace.reply("settings")])
        .unwrap();

    let mut app = Router::new();
    app.mount("/users", users)
        .unwrap()
        .mount("/users/admin", admin)
        .unwrap();

    let outcome = get(app, "/users/admin/settings").await;
    assert_eq!(body(&outcome), "settings");
    assert_eq!(trace.calls(), ["settings"]);
}

#[tokio::test]
async fn multiple_params_keep_pattern_order() {
    let mut router = Router::new();
    router
        .register(
            Method::Get,
            "/posts/:postId/comments/:commentId",
            vec![echo_params()],
        )
        .unwrap();

    let outcome = get(router, "/posts/12/comments/7").await;
    assert_eq!(body(&outcome), "postId=12,commentId=7");
}

#[tokio::test]
async fn query_string_is_excluded_from_matching() {
    let mut router = Router::new();
    router
        .register(
            Method::Get,
            "/orders/:id",
            vec![std::sync::Arc::new(switchyard::from_fn(
                "order",
                |ctx, _next| {
                    let id = ctx.params.get("id").unwrap_or_default().to_string();
                    let format = ctx.get_query("format").unwrap_or_default().to_string();
                    ctx.send(switchyard::Response::text(format!("{id} as {format}")))
                },
            ))],
        )
        .unwrap();

    let outcome = get(router, "/orders/12?format=json").await;
    assert_eq!(body(&outcome), "12 as json");
}

#[tokio::test]
async fn method_must_match() {
    let trace = Trace::default();
    let mut router = Router::new();
    router
        .register(Method::Post, "/orders", vec![trace.reply("create")])
        .unwrap();

    let outcome = get(router, "/orders").await;
    assert!(matches!(outcome, Outcome::NotFound(_)));
    assert!(trace.calls().is_empty());
}
