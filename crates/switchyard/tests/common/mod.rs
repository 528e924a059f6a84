#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use switchyard::{from_fn, BoxedHandler, Dispatcher, Outcome, RawRequest, Response, Router};

/// Records the order in which handlers ran.
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    /// A handler that records itself and continues.
    pub fn pass(&self, name: &'static str) -> BoxedHandler {
        let trace = self.clone();
        Arc::new(from_fn(name, move |_ctx, next| {
            trace.push(name);
            Ok(next.proceed())
        }))
    }

    /// A handler that records itself and answers with its name.
    pub fn reply(&self, name: &'static str) -> BoxedHandler {
        let trace = self.clone();
        Arc::new(from_fn(name, move |ctx, _next| {
            trace.push(name);
            ctx.send(Response::text(name))
        }))
    }
}

/// A handler that answers with the captured parameters as `k=v` pairs.
pub fn echo_params() -> BoxedHandler {
    Arc::new(from_fn("echo-params", |ctx, _next| {
        let body = ctx
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        ctx.send(Response::text(body))
    }))
}

pub async fn get(router: Router, target: &str) -> Outcome {
    Dispatcher::new(router).dispatch(RawRequest::get(target)).await
}

pub fn body(outcome: &Outcome) -> String {
    outcome
        .response()
        .and_then(|r| r.body_string())
        .unwrap_or_default()
}
