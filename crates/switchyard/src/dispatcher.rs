//! Top-level entry point: raw request in, outcome out.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error};

use crate::context::{Body, RequestContext};
use crate::error::ChainError;
use crate::executor::{CancelSignal, ChainOutcome, Executor};
use crate::handler::ChainLink;
use crate::request::{split_target, Method, RawRequest};
use crate::response::Response;
use crate::router::{Resolution, Router};

/// Default responses produced by the dispatcher itself.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Status when no route matches.
    pub not_found_status: u16,
    /// Body when no route matches.
    pub not_found_body: String,
    /// Status when a matched chain ran out without a response.
    pub exhausted_status: u16,
    /// Body when a matched chain ran out without a response.
    pub exhausted_body: String,
    /// Status when a handler stalled the chain.
    pub stalled_status: u16,
    /// Body when a handler stalled the chain.
    pub stalled_body: String,
    /// Status when a handler faulted.
    pub fault_status: u16,
    /// Body when a handler faulted.
    pub fault_body: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            not_found_status: 404,
            not_found_body: "Not Found".to_string(),
            exhausted_status: 500,
            exhausted_body: "No handler produced a response".to_string(),
            stalled_status: 500,
            stalled_body: "Internal Server Error".to_string(),
            fault_status: 500,
            fault_body: "Internal Server Error".to_string(),
        }
    }
}

/// What the observability collaborator is told about a failed chain.
#[derive(Debug)]
pub struct FaultReport<'a> {
    /// Request method.
    pub method: Method,
    /// Request path, query string removed.
    pub path: &'a str,
    /// Full pattern of the matched route, if one matched.
    pub route: Option<&'a str>,
    /// The fault.
    pub error: &'a ChainError,
}

/// Receives handler faults and stalls. The caller only ever sees a generic
/// response.
pub trait FaultReporter: Send + Sync {
    /// Records one fault.
    fn report(&self, report: &FaultReport<'_>);
}

/// Reports faults as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FaultReporter for TracingReporter {
    fn report(&self, report: &FaultReport<'_>) {
        error!(
            method = %report.method,
            path = report.path,
            route = report.route.unwrap_or("-"),
            "request failed: {}",
            report.error
        );
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A handler finalized the response.
    Sent(Response),
    /// No route matched, or only middleware applied and none answered.
    NotFound(Response),
    /// A route matched but its chain ran out without a response.
    Exhausted(Response),
    /// A handler neither answered nor continued.
    Stalled(Response),
    /// A handler faulted.
    Faulted(Response),
    /// The client went away; no response is delivered.
    Cancelled,
}

impl Outcome {
    /// Returns the response to deliver, if any.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Sent(r)
            | Self::NotFound(r)
            | Self::Exhausted(r)
            | Self::Stalled(r)
            | Self::Faulted(r) => Some(r),
            Self::Cancelled => None,
        }
    }

    /// Borrows the response to deliver, if any.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Sent(r)
            | Self::NotFound(r)
            | Self::Exhausted(r)
            | Self::Stalled(r)
            | Self::Faulted(r) => Some(r),
            Self::Cancelled => None,
        }
    }

    /// Returns the status of the response to deliver, if any.
    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }
}

/// Owns the root router and turns raw requests into outcomes.
///
/// # Example
///
/// ```
/// use switchyard::{from_fn, Dispatcher, Outcome, RawRequest, Response, Router};
///
/// # futures::executor::block_on(async {
/// let mut router = Router::new();
/// router
///     .get("/orders/:id", from_fn("order", |ctx, _next| {
///         let id = ctx.params.get("id").unwrap_or_default().to_string();
///         ctx.send(Response::text(id))
///     }))
///     .unwrap();
///
/// let dispatcher = Dispatcher::new(router);
/// let outcome = dispatcher.dispatch(RawRequest::get("/orders/12?format=json")).await;
/// assert!(matches!(outcome, Outcome::Sent(ref r) if r.body == b"12"));
/// # });
/// ```
pub struct Dispatcher {
    router: Router,
    config: DispatcherConfig,
    reporter: Arc<dyn FaultReporter>,
}

impl Dispatcher {
    /// Creates a dispatcher with default configuration.
    pub fn new(router: Router) -> Self {
        Self::with_config(router, DispatcherConfig::default())
    }

    /// Creates a dispatcher with explicit configuration.
    pub fn with_config(router: Router, config: DispatcherConfig) -> Self {
        Self {
            router,
            config,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Replaces the fault reporter.
    #[must_use]
    pub fn reporter(mut self, reporter: impl FaultReporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Returns the root router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatches one request.
    pub async fn dispatch(&self, request: RawRequest) -> Outcome {
        self.run(request, Executor::new()).await
    }

    /// Dispatches one request, stopping between handlers once `cancel`
    /// fires.
    pub async fn dispatch_with_cancel(&self, request: RawRequest, cancel: CancelSignal) -> Outcome {
        self.run(request, Executor::with_cancel(cancel)).await
    }

    async fn run(&self, request: RawRequest, executor: Executor) -> Outcome {
        let Some(method) = Method::parse(&request.method) else {
            debug!("unsupported method '{}'", request.method);
            return Outcome::NotFound(self.not_found());
        };

        let (path, _) = split_target(&request.target);
        let (chain, route) = match self.router.resolve(method, path) {
            Resolution::Matched(hit) => (hit.chain, Some((hit.params, hit.pattern))),
            Resolution::Unrouted(chain) if chain.is_empty() => {
                return Outcome::NotFound(self.not_found());
            }
            Resolution::Unrouted(chain) => (chain, None),
        };

        let mut ctx = RequestContext::new(method, &request.target);
        ctx.headers = request.headers;
        ctx.body = Body::from_bytes(request.body);

        let pattern = match route {
            Some((params, pattern)) => {
                ctx.params = params;
                Some(pattern)
            }
            None => None,
        };

        self.execute(&executor, &chain, ctx, pattern.as_deref()).await
    }

    async fn execute(
        &self,
        executor: &Executor,
        chain: &[ChainLink],
        mut ctx: RequestContext,
        route: Option<&str>,
    ) -> Outcome {
        let result = executor.run(chain, &mut ctx).await;
        let path = ctx.raw_path.clone();

        match result {
            Ok(ChainOutcome::Sent) => {
                let response = ctx.response.into_response();
                debug!("{} {} -> {}", ctx.method, path, response.status);
                Outcome::Sent(response)
            }
            Ok(ChainOutcome::Exhausted) if route.is_some() => {
                debug!("{} {} exhausted its chain", ctx.method, path);
                Outcome::Exhausted(Response::plain(
                    self.config.exhausted_status,
                    self.config.exhausted_body.clone(),
                ))
            }
            Ok(ChainOutcome::Exhausted) => Outcome::NotFound(self.not_found()),
            Ok(ChainOutcome::Cancelled) => {
                debug!("{} {} cancelled", ctx.method, path);
                Outcome::Cancelled
            }
            Err(err) => {
                self.reporter.report(&FaultReport {
                    method: ctx.method,
                    path: &path,
                    route,
                    error: &err,
                });
                match err {
                    ChainError::Stalled { .. } => Outcome::Stalled(Response::plain(
                        self.config.stalled_status,
                        self.config.stalled_body.clone(),
                    )),
                    ChainError::Handler { .. } => Outcome::Faulted(Response::plain(
                        self.config.fault_status,
                        self.config.fault_body.clone(),
                    )),
                }
            }
        }
    }

    fn not_found(&self) -> Response {
        Response::plain(
            self.config.not_found_status,
            self.config.not_found_body.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::HandlerError;
    use crate::handler::from_fn;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl FaultReporter for Arc<Recorder> {
        fn report(&self, report: &FaultReport<'_>) {
            self.0
                .lock()
                .unwrap()
                .push(format!("{} {} {}", report.method, report.path, report.error));
        }
    }

    #[tokio::test]
    async fn test_fault_detail_goes_to_reporter_only() {
        let mut router = Router::new();
        router
            .get("/boom", from_fn("boom", |_ctx, _next| {
                Err(HandlerError::msg("secret database password rejected"))
            }))
            .unwrap();

        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(router).reporter(Arc::clone(&recorder));

        let outcome = dispatcher.dispatch(RawRequest::get("/boom")).await;
        let response = match outcome {
            Outcome::Faulted(response) => response,
            other => panic!("expected a fault, got {other:?}"),
        };
        assert_eq!(response.status, 500);
        assert!(!response.body_string().unwrap().contains("secret"));

        let reports = recorder.0.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("secret database password rejected"));
    }

    #[tokio::test]
    async fn test_unknown_method_is_not_found() {
        let mut router = Router::new();
        router
            .all("/", from_fn("any", |ctx, _next| ctx.send(Response::ok())))
            .unwrap();

        let outcome = Dispatcher::new(router)
            .dispatch(RawRequest::new("BREW", "/"))
            .await;
        assert!(matches!(outcome, Outcome::NotFound(_)));
    }

    #[tokio::test]
    async fn test_config_overrides_defaults() {
        let config = DispatcherConfig {
            not_found_status: 410,
            not_found_body: "gone".to_string(),
            ..DispatcherConfig::default()
        };
        let outcome = Dispatcher::with_config(Router::new(), config)
            .dispatch(RawRequest::get("/anything"))
            .await;
        assert_eq!(outcome.status(), Some(410));
        assert_eq!(
            outcome.into_response().unwrap().body_string().as_deref(),
            Some("gone")
        );
    }

    #[test]
    fn test_config_deserializes_partially() {
        let config: DispatcherConfig =
            serde_json::from_str(r#"{"exhausted_status": 501}"#).unwrap();
        assert_eq!(config.exhausted_status, 501);
        assert_eq!(config.not_found_status, 404);
    }
}
