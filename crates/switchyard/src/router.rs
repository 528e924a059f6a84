//! Route table, mounting and first-match resolution.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, RouterError};
use crate::handler::{BoxedHandler, ChainLink, Handler};
use crate::path::PathPattern;
use crate::request::{split_target, Method, MethodFilter, PathParams};

#[derive(Clone)]
struct Route {
    name: Option<String>,
    method: MethodFilter,
    pattern: PathPattern,
    handlers: Vec<BoxedHandler>,
}

#[derive(Clone)]
struct Mount {
    prefix: String,
    router: Arc<Router>,
}

#[derive(Clone)]
struct Middleware {
    prefix: String,
    handler: BoxedHandler,
}

#[derive(Clone)]
enum Entry {
    Route(Route),
    Mount(Mount),
    Middleware(Middleware),
}

/// A resolved route: the flattened chain and the captured parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Middleware collected ahead of the route, then the route's handlers.
    pub chain: Vec<ChainLink>,
    /// Parameters captured by the route pattern.
    pub params: PathParams,
    /// Full pattern of the matched route, mount prefixes included.
    pub pattern: String,
}

/// The result of walking a router for one request.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A concrete route matched.
    Matched(RouteMatch),
    /// No route matched; holds the root-level middleware that applied.
    Unrouted(Vec<ChainLink>),
}

/// One row of the flattened route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Method filter.
    pub method: MethodFilter,
    /// Full path pattern, mount prefixes included.
    pub path: String,
    /// Route name, if any.
    pub name: Option<String>,
}

/// An ordered table of routes, middleware and mounted sub-routers.
///
/// Entries are evaluated strictly in registration order and the first
/// entry that yields a concrete route wins, however specific later entries
/// are. A mounted sub-router counts only if one of its own routes matches
/// the remainder of the path; otherwise evaluation continues with the next
/// entry at the mounting level.
///
/// Routers are built during setup and are read-only afterwards.
///
/// # Example
///
/// ```
/// use switchyard::{from_fn, Method, Response, Router};
///
/// let mut users = Router::new();
/// users
///     .get("/:username", from_fn("profile", |ctx, _next| {
///         let name = ctx.params.get("username").unwrap_or_default().to_string();
///         ctx.send(Response::text(name))
///     }))
///     .unwrap();
///
/// let mut app = Router::new();
/// app.mount("/users", users).unwrap();
///
/// let hit = app.match_route(Method::Get, "/users/phil").unwrap();
/// assert_eq!(hit.params.get("username"), Some("phil"));
/// assert!(app.match_route(Method::Get, "/phil").is_none());
/// ```
#[derive(Clone, Default)]
pub struct Router {
    entries: Vec<Entry>,
}

impl Router {
    /// Creates a new empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route with an ordered handler chain.
    pub fn register(
        &mut self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self> {
        self.push_route(None, method.into(), pattern, handlers)
    }

    /// Registers a named route, available to [`url_for`](Self::url_for).
    pub fn register_named(
        &mut self,
        name: &str,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self> {
        self.push_route(Some(name.to_string()), method.into(), pattern, handlers)
    }

    /// Adds a GET route.
    pub fn get(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<&mut Self> {
        self.register(Method::Get, pattern, vec![Arc::new(handler)])
    }

    /// Adds a POST route.
    pub fn post(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<&mut Self> {
        self.register(Method::Post, pattern, vec![Arc::new(handler)])
    }

    /// Adds a PUT route.
    pub fn put(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<&mut Self> {
        self.register(Method::Put, pattern, vec![Arc::new(handler)])
    }

    /// Adds a PATCH route.
    pub fn patch(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<&mut Self> {
        self.register(Method::Patch, pattern, vec![Arc::new(handler)])
    }

    /// Adds a DELETE route.
    pub fn delete(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<&mut Self> {
        self.register(Method::Delete, pattern, vec![Arc::new(handler)])
    }

    /// Adds a route matching every method.
    pub fn all(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<&mut Self> {
        self.register(MethodFilter::Any, pattern, vec![Arc::new(handler)])
    }

    /// Adds middleware that runs for every request reaching this entry.
    pub fn middleware(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.entries.push(Entry::Middleware(Middleware {
            prefix: String::new(),
            handler: Arc::new(handler),
        }));
        self
    }

    /// Adds middleware that runs only for paths under a literal prefix.
    ///
    /// The handler sees [`RequestContext::path`](crate::RequestContext::path)
    /// relative to `prefix`.
    pub fn middleware_at(
        &mut self,
        prefix: &str,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self> {
        let prefix = normalize_prefix(prefix)?;
        self.entries.push(Entry::Middleware(Middleware {
            prefix,
            handler: Arc::new(handler),
        }));
        Ok(self)
    }

    /// Mounts a sub-router under a literal prefix.
    ///
    /// One trailing `/` is trimmed; `/` mounts at the root. A router
    /// wrapped in an [`Arc`] can be mounted in several places.
    pub fn mount(&mut self, prefix: &str, router: impl Into<Arc<Router>>) -> Result<&mut Self> {
        let prefix = normalize_prefix(prefix)?;
        debug!("mounted router at '{}'", prefix);
        self.entries.push(Entry::Mount(Mount {
            prefix,
            router: router.into(),
        }));
        Ok(self)
    }

    /// Finds the first route matching `method` and `path`.
    ///
    /// Returns `None` when nothing in the tree matches; that is an expected
    /// outcome, not an error.
    pub fn match_route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        match self.resolve(method, path) {
            Resolution::Matched(hit) => Some(hit),
            Resolution::Unrouted(_) => None,
        }
    }

    /// Walks the tree for `method` and `path` and returns what applies.
    ///
    /// Any `?query` suffix of `path` is ignored.
    pub fn resolve(&self, method: Method, path: &str) -> Resolution {
        let (path, _) = split_target(path);
        let mut chain = Vec::new();
        match self.walk(method, path, "", &mut chain) {
            Some((params, pattern)) => {
                debug!("{} {} matched '{}'", method, path, pattern);
                Resolution::Matched(RouteMatch {
                    chain,
                    params,
                    pattern,
                })
            }
            None => {
                debug!("{} {} matched no route", method, path);
                Resolution::Unrouted(chain)
            }
        }
    }

    /// Generates a URL for a named route, searching mounted routers too.
    pub fn url_for(&self, name: &str, params: &HashMap<String, String>) -> Option<String> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Route(route) if route.name.as_deref() == Some(name) => {
                route.pattern.reverse(params)
            }
            Entry::Mount(mount) => mount
                .router
                .url_for(name, params)
                .map(|path| join_path(&mount.prefix, &path)),
            _ => None,
        })
    }

    /// Lists every route in registration order, mounts flattened.
    pub fn routes(&self) -> Vec<RouteInfo> {
        let mut out = Vec::new();
        self.collect_routes("", &mut out);
        out
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_route(
        &mut self,
        name: Option<String>,
        method: MethodFilter,
        pattern: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self> {
        let pattern = PathPattern::compile(pattern)?;
        debug!("registered {} '{}'", method, pattern.pattern());
        self.entries.push(Entry::Route(Route {
            name,
            method,
            pattern,
            handlers,
        }));
        Ok(self)
    }

    fn walk(
        &self,
        method: Method,
        path: &str,
        base: &str,
        chain: &mut Vec<ChainLink>,
    ) -> Option<(PathParams, String)> {
        for entry in &self.entries {
            match entry {
                Entry::Middleware(mw) => {
                    if strip_mount(path, &mw.prefix).is_some() {
                        let link_base = format!("{base}{}", mw.prefix);
                        chain.push(ChainLink::new(Arc::clone(&mw.handler), link_base));
                    }
                }
                Entry::Route(route) => {
                    if !route.method.accepts(method) {
                        continue;
                    }
                    if let Some(params) = route.pattern.match_path(path) {
                        chain.extend(
                            route
                                .handlers
                                .iter()
                                .map(|h| ChainLink::new(Arc::clone(h), base)),
                        );
                        return Some((params, join_path(base, route.pattern.pattern())));
                    }
                }
                Entry::Mount(mount) => {
                    let Some(rest) = strip_mount(path, &mount.prefix) else {
                        continue;
                    };
                    let mark = chain.len();
                    let sub_base = format!("{base}{}", mount.prefix);
                    if let Some(hit) = mount.router.walk(method, rest, &sub_base, chain) {
                        return Some(hit);
                    }
                    // The mount's middleware only applies to routes it resolves.
                    chain.truncate(mark);
                }
            }
        }
        None
    }

    fn collect_routes(&self, base: &str, out: &mut Vec<RouteInfo>) {
        for entry in &self.entries {
            match entry {
                Entry::Route(route) => out.push(RouteInfo {
                    method: route.method,
                    path: join_path(base, route.pattern.pattern()),
                    name: route.name.clone(),
                }),
                Entry::Mount(mount) => {
                    mount
                        .router
                        .collect_routes(&format!("{base}{}", mount.prefix), out);
                }
                Entry::Middleware(_) => {}
            }
        }
    }
}

/// Validates a mount prefix and trims one trailing separator.
fn normalize_prefix(prefix: &str) -> Result<String> {
    if prefix.is_empty() {
        return Err(RouterError::mount(prefix, "prefix is empty"));
    }
    if !prefix.starts_with('/') {
        return Err(RouterError::mount(prefix, "prefix must start with '/'"));
    }
    let trimmed = prefix.strip_suffix('/').unwrap_or(prefix);
    if trimmed.ends_with('/') {
        return Err(RouterError::mount(prefix, "repeated trailing separator"));
    }
    if trimmed.contains("//") {
        return Err(RouterError::mount(prefix, "empty path segment"));
    }
    if trimmed.contains('?') {
        return Err(RouterError::mount(prefix, "query strings are not allowed"));
    }
    if trimmed.split('/').any(|seg| seg.starts_with(':')) {
        return Err(RouterError::mount(
            prefix,
            "parameter placeholders are not allowed",
        ));
    }
    Ok(trimmed.to_string())
}

/// Strips `prefix` from `path` if it is followed by end-of-path or `/`.
fn strip_mount<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

fn join_path(prefix: &str, path: &str) -> String {
    let path = path.trim_end_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (false, true) => prefix.to_string(),
        _ if path.starts_with('/') => format!("{prefix}{path}"),
        _ => format!("{prefix}/{path}"),
    }
}
