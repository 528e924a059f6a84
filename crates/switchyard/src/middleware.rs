//! Bundled middleware: body parsing, request logging, CORS and an auth gate.

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info};

use crate::context::{Body, RequestContext};
use crate::handler::{Handler, HandlerResult, Next};
use crate::request::{parse_query_string, Method};
use crate::response::Response;

/// Decodes `application/json` bodies into [`Body::Json`].
///
/// Requests with another content type pass through untouched. A body that
/// is not valid JSON is answered with 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody;

impl Handler for JsonBody {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        async move {
            if ctx.content_type() != Some("application/json") {
                return Ok(next.proceed());
            }
            let Some(bytes) = ctx.body.as_bytes() else {
                return Ok(next.proceed());
            };
            match serde_json::from_slice(bytes) {
                Ok(value) => {
                    ctx.body = Body::Json(value);
                    Ok(next.proceed())
                }
                Err(e) => {
                    debug!("rejecting malformed json body: {}", e);
                    ctx.send(Response::bad_request())
                }
            }
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "json-body"
    }
}

/// Decodes `application/x-www-form-urlencoded` bodies into [`Body::Form`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBody;

impl Handler for FormBody {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        async move {
            if ctx.content_type() != Some("application/x-www-form-urlencoded") {
                return Ok(next.proceed());
            }
            let Some(bytes) = ctx.body.as_bytes() else {
                return Ok(next.proceed());
            };
            match std::str::from_utf8(bytes) {
                Ok(text) => {
                    ctx.body = Body::Form(parse_query_string(text));
                    Ok(next.proceed())
                }
                Err(_) => ctx.send(Response::bad_request()),
            }
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "form-body"
    }
}

/// Decodes `text/*` bodies into [`Body::Text`].
///
/// A body that is not valid UTF-8 is answered with 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBody;

impl Handler for TextBody {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        async move {
            if !ctx.content_type().is_some_and(|t| t.starts_with("text/")) {
                return Ok(next.proceed());
            }
            let bytes = match std::mem::take(&mut ctx.body) {
                Body::Bytes(bytes) => bytes,
                other => {
                    ctx.body = other;
                    return Ok(next.proceed());
                }
            };
            match String::from_utf8(bytes) {
                Ok(text) => {
                    ctx.body = Body::Text(text);
                    Ok(next.proceed())
                }
                Err(e) => {
                    ctx.body = Body::Bytes(e.into_bytes());
                    ctx.send(Response::bad_request())
                }
            }
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "text-body"
    }
}

/// Logs each request at `info` level and continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl Handler for RequestLogger {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        info!("--> {} {}", ctx.method, ctx.raw_path);
        async move { Ok(next.proceed()) }.boxed()
    }

    fn name(&self) -> &str {
        "request-logger"
    }
}

/// Adds CORS headers and answers preflight requests.
#[derive(Debug, Clone)]
pub struct Cors {
    /// Allowed origins.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed headers.
    pub allowed_headers: Vec<String>,
}

impl Cors {
    /// Creates CORS middleware that allows all origins.
    pub fn permissive() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allowed_headers: vec!["*".to_string()],
        }
    }

    /// Creates CORS middleware with specific origins.
    pub fn new(origins: &[&str]) -> Self {
        Self {
            allowed_origins: origins.iter().map(|s| (*s).to_string()).collect(),
            allowed_methods: ["GET", "POST", "PUT", "DELETE"].map(String::from).to_vec(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
        }
    }
}

impl Handler for Cors {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        async move {
            let origins = self.allowed_origins.join(", ");
            if ctx.method == Method::Options {
                let preflight = Response::new(204)
                    .header("Access-Control-Allow-Origin", origins)
                    .header(
                        "Access-Control-Allow-Methods",
                        self.allowed_methods.join(", "),
                    )
                    .header(
                        "Access-Control-Allow-Headers",
                        self.allowed_headers.join(", "),
                    )
                    .header("Access-Control-Max-Age", "86400");
                return ctx.send(preflight);
            }
            ctx.response
                .set_header("Access-Control-Allow-Origin", origins)?;
            Ok(next.proceed())
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "cors"
    }
}

/// Lets a request through only if it carries credentials.
///
/// A request is authenticated when it has an `Authorization` header or a
/// `session=` cookie. Anything else is redirected to the login URL.
#[derive(Debug, Clone)]
pub struct RequireAuth {
    /// Path prefixes that skip the check.
    pub exclude: Vec<String>,
    /// The login redirect URL.
    pub login_url: String,
}

impl RequireAuth {
    /// Creates the auth gate.
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            exclude: Vec::new(),
            login_url: login_url.into(),
        }
    }

    /// Adds path prefixes that skip the check.
    #[must_use]
    pub fn exclude(mut self, paths: &[&str]) -> Self {
        self.exclude = paths.iter().map(|s| (*s).to_string()).collect();
        self
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    fn is_authenticated(ctx: &RequestContext) -> bool {
        ctx.get_header("Authorization").is_some()
            || ctx
                .get_header("Cookie")
                .is_some_and(|c| c.split(';').any(|kv| kv.trim().starts_with("session=")))
    }
}

impl Handler for RequireAuth {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        async move {
            if self.is_excluded(ctx.path()) || Self::is_authenticated(ctx) {
                Ok(next.proceed())
            } else {
                ctx.send(Response::redirect(self.login_url.clone()))
            }
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "require-auth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(handler: &dyn Handler, ctx: &mut RequestContext) -> bool {
        handler
            .handle(ctx, Next::new(0, 1))
            .await
            .unwrap()
            .is_continue()
    }

    fn post_with(content_type: &str, body: &str) -> RequestContext {
        RequestContext::new(Method::Post, "/")
            .with_header("Content-Type", content_type)
            .with_body(Body::from_bytes(body.as_bytes().to_vec()))
    }

    #[tokio::test]
    async fn test_json_body_decodes() {
        let mut ctx = post_with("application/json; charset=utf-8", r#"{"name":"phil"}"#);
        assert!(run(&JsonBody, &mut ctx).await);
        assert_eq!(
            ctx.body.as_json(),
            Some(&serde_json::json!({"name": "phil"}))
        );
        assert!(!ctx.response.is_sent());
    }

    #[tokio::test]
    async fn test_json_body_ignores_other_types() {
        let mut ctx = post_with("text/plain", "hello");
        assert!(run(&JsonBody, &mut ctx).await);
        assert_eq!(ctx.body, Body::Bytes(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_json_body_rejects_malformed() {
        let mut ctx = post_with("application/json", "{not json");
        assert!(!run(&JsonBody, &mut ctx).await);
        assert!(ctx.response.is_sent());
        assert_eq!(ctx.response.response().status, 400);
    }

    #[tokio::test]
    async fn test_form_body_decodes() {
        let mut ctx = post_with("application/x-www-form-urlencoded", "a=1&b=two+words");
        assert!(run(&FormBody, &mut ctx).await);
        let form = ctx.body.as_form().unwrap();
        assert_eq!(form.get("a").map(String::as_str), Some("1"));
        assert_eq!(form.get("b").map(String::as_str), Some("two words"));
    }

    #[tokio::test]
    async fn test_cors_preflight_and_header() {
        let cors = Cors::new(&["https://example.com"]);

        let mut preflight = RequestContext::new(Method::Options, "/api");
        assert!(!run(&cors, &mut preflight).await);
        assert_eq!(preflight.response.response().status, 204);

        let mut ctx = RequestContext::new(Method::Get, "/api");
        assert!(run(&cors, &mut ctx).await);
        assert_eq!(
            ctx.response
                .response()
                .get_header("Access-Control-Allow-Origin"),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn test_require_auth() {
        let gate = RequireAuth::new("/login").exclude(&["/public"]);

        let mut anonymous = RequestContext::new(Method::Get, "/admin");
        assert!(!run(&gate, &mut anonymous).await);
        assert_eq!(
            anonymous.response.response().get_header("Location"),
            Some("/login")
        );

        let mut public = RequestContext::new(Method::Get, "/public/file.txt");
        assert!(run(&gate, &mut public).await);

        let mut public_root = RequestContext::new(Method::Get, "/public");
        assert!(run(&gate, &mut public_root).await);

        let mut cookie = RequestContext::new(Method::Get, "/admin")
            .with_header("Cookie", "theme=dark; session=abc");
        assert!(run(&gate, &mut cookie).await);
    }

    #[tokio::test]
    async fn test_require_auth_exclusion_stops_at_segment_boundary() {
        let gate = RequireAuth::new("/login").exclude(&["/public"]);

        let mut lookalike = RequestContext::new(Method::Get, "/publicity/plan");
        assert!(!run(&gate, &mut lookalike).await);
        assert_eq!(lookalike.response.response().status, 302);
    }

    #[tokio::test]
    async fn test_text_body_decodes() {
        let mut ctx = post_with("text/plain; charset=utf-8", "hello there");
        assert!(run(&TextBody, &mut ctx).await);
        assert_eq!(ctx.body, Body::Text("hello there".to_string()));
        assert_eq!(ctx.body.as_bytes(), Some("hello there".as_bytes()));

        let mut json = post_with("application/json", "{}");
        assert!(run(&TextBody, &mut json).await);
        assert!(matches!(json.body, Body::Bytes(_)));
    }

    #[tokio::test]
    async fn test_text_body_rejects_invalid_utf8() {
        let mut ctx = RequestContext::new(Method::Post, "/")
            .with_header("Content-Type", "text/plain")
            .with_body(Body::from_bytes(vec![0xff, 0xfe]));
        assert!(!run(&TextBody, &mut ctx).await);
        assert_eq!(ctx.response.response().status, 400);
    }

    #[tokio::test]
    async fn test_request_logger_continues() {
        let mut ctx = RequestContext::new(Method::Get, "/x");
        assert!(run(&RequestLogger, &mut ctx).await);
    }
}
