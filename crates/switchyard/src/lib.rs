//! # switchyard
//!
//! A transport-agnostic request routing and middleware dispatch engine.
//!
//! This crate provides:
//! - Path patterns with named parameters (`/posts/:id`)
//! - Ordered, first-match routing with mountable sub-routers
//! - Middleware chains with an explicit continuation
//! - A dispatcher that turns raw requests into responses
//! - Body parsing, static files, CORS and logging middleware
//!
//! ## Quick Start
//!
//! ```ignore
//! use switchyard::{from_fn, Dispatcher, JsonBody, RawRequest, Response, Router};
//!
//! let mut users = Router::new();
//! users.get("/:username", from_fn("profile", |ctx, _next| {
//!     let name = ctx.params.require("username").map_err(HandlerError::msg)?;
//!     ctx.send(Response::text(format!("hello {name}")))
//! }))?;
//!
//! let mut app = Router::new();
//! app.middleware(JsonBody);
//! app.mount("/users", users)?;
//!
//! let dispatcher = Dispatcher::new(app);
//! let outcome = dispatcher.dispatch(RawRequest::get("/users/phil")).await;
//! ```
//!
//! ## Matching rules
//!
//! Entries are tried in registration order and the first concrete match
//! wins. A pattern matches only paths with exactly as many segments. A
//! mount whose prefix matches but whose sub-router has no matching route
//! does not stop the search: the next entry at the same level is tried.
//!
//! ## Handlers
//!
//! Every handler receives the request context and a [`Next`]. It finalizes
//! the response through [`RequestContext::send`] (or the
//! [`ResponseState`] methods), or returns [`Next::proceed`] to hand over to
//! the next handler. Returning [`Flow::done`] without a response is a
//! stall and is answered with a server fault.

mod context;
mod dispatcher;
mod error;
mod executor;
mod handler;
mod middleware;
mod path;
mod request;
mod response;
mod router;
mod static_files;

pub use context::{Body, RequestContext, ResponseState};
pub use dispatcher::{
    Dispatcher, DispatcherConfig, FaultReport, FaultReporter, Outcome, TracingReporter,
};
pub use error::{ChainError, HandlerError, Result, RouterError};
pub use executor::{cancellation, CancelHandle, CancelSignal, ChainOutcome, Executor};
pub use futures::future::BoxFuture;
pub use handler::{
    from_async_fn, from_fn, AsyncFnHandler, BoxedHandler, ChainLink, Flow, FnHandler, Handler,
    HandlerResult, Next,
};
pub use middleware::{Cors, FormBody, JsonBody, RequestLogger, RequireAuth, TextBody};
pub use path::{PathPattern, PathSegment};
pub use request::{parse_query_string, split_target, Method, MethodFilter, PathParams, RawRequest};
pub use response::Response;
pub use router::{Resolution, RouteInfo, RouteMatch, Router};
pub use static_files::{content_type, StaticFiles, StaticFilesConfig};
