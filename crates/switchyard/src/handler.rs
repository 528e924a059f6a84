//! The handler contract and the continuation capability.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::context::RequestContext;
use crate::error::HandlerError;

/// What a handler returns.
pub type HandlerResult = Result<Flow, HandlerError>;

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// How a handler left the chain.
///
/// A `Flow` that continues can only be obtained from [`Next::proceed`].
#[must_use = "a handler must return the Flow it produced"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow(FlowKind);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowKind {
    Continue,
    Done,
}

impl Flow {
    /// The handler is finished and does not want the chain to continue.
    ///
    /// Returning this without having finalized the response stalls the
    /// chain.
    pub fn done() -> Self {
        Self(FlowKind::Done)
    }

    /// Returns true if the handler asked for the next handler to run.
    pub fn is_continue(&self) -> bool {
        self.0 == FlowKind::Continue
    }
}

/// The continuation handed to each handler invocation.
///
/// It can be used at most once; proceeding consumes it.
pub struct Next {
    index: usize,
    remaining: usize,
}

impl Next {
    pub(crate) fn new(index: usize, remaining: usize) -> Self {
        Self { index, remaining }
    }

    /// Passes control to the next handler in the chain.
    pub fn proceed(self) -> Flow {
        Flow(FlowKind::Continue)
    }

    /// Position of the current handler in the chain.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of handlers after the current one.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("remaining", &self.remaining)
            .finish()
    }
}

/// A unit of request processing.
///
/// A handler receives the request context and the continuation. It either
/// finalizes the response (see [`ResponseState`](crate::ResponseState)),
/// proceeds with [`Next::proceed`], or fails. It may await external work
/// before deciding; the next handler never starts before it returns.
///
/// # Example
///
/// ```ignore
/// struct Stamp;
///
/// impl Handler for Stamp {
///     fn handle<'a>(&'a self, ctx: &'a mut RequestContext, next: Next) -> BoxFuture<'a, HandlerResult> {
///         Box::pin(async move {
///             ctx.response.set_header("X-Stamp", "1")?;
///             Ok(next.proceed())
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync {
    /// Processes the request.
    fn handle<'a>(&'a self, ctx: &'a mut RequestContext, next: Next)
        -> BoxFuture<'a, HandlerResult>;

    /// Name used in logs and chain errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        (**self).handle(ctx, next)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Handler built from a synchronous closure. See [`from_fn`].
pub struct FnHandler<F> {
    name: String,
    f: F,
}

/// Wraps a synchronous closure as a handler.
///
/// ```
/// use switchyard::{from_fn, Response};
///
/// let hello = from_fn("hello", |ctx, _next| ctx.send(Response::text("hi")));
/// ```
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnHandler<F>
where
    F: Fn(&mut RequestContext, Next) -> HandlerResult + Send + Sync + 'static,
{
    FnHandler {
        name: name.into(),
        f,
    }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut RequestContext, Next) -> HandlerResult + Send + Sync + 'static,
{
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        let result = (self.f)(ctx, next);
        async move { result }.boxed()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler built from a closure returning a boxed future. See
/// [`from_async_fn`].
pub struct AsyncFnHandler<F> {
    name: String,
    f: F,
}

/// Wraps an async closure as a handler.
///
/// ```
/// use futures::FutureExt;
/// use switchyard::{from_async_fn, Response};
///
/// let slow = from_async_fn("slow", |ctx, _next| {
///     async move { ctx.send(Response::text("eventually")) }.boxed()
/// });
/// ```
pub fn from_async_fn<F>(name: impl Into<String>, f: F) -> AsyncFnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    AsyncFnHandler {
        name: name.into(),
        f,
    }
}

impl<F> Handler for AsyncFnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.f)(ctx, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One step of a resolved chain: a handler and the mount prefix it was
/// registered under.
#[derive(Clone)]
pub struct ChainLink {
    /// The handler to run.
    pub handler: BoxedHandler,
    /// Absolute mount prefix (empty at the root).
    pub base: String,
}

impl ChainLink {
    /// Creates a link.
    pub fn new(handler: BoxedHandler, base: impl Into<String>) -> Self {
        Self {
            handler,
            base: base.into(),
        }
    }
}

impl fmt::Debug for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainLink")
            .field("handler", &self.handler.name())
            .field("base", &self.base)
            .finish()
    }
}
