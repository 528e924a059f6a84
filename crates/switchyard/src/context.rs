//! Per-request mutable state shared by the handlers of one chain.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::HandlerError;
use crate::handler::Flow;
use crate::request::{parse_query_string, split_target, Method, PathParams};
use crate::response::Response;

/// The request body, raw or as decoded by a body-parsing handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body was sent.
    #[default]
    Empty,
    /// Undecoded bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// A decoded JSON document.
    Json(serde_json::Value),
    /// Decoded `application/x-www-form-urlencoded` fields.
    Form(IndexMap<String, String>),
}

impl Body {
    /// Wraps raw bytes, mapping an empty buffer to [`Body::Empty`].
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            Self::Empty
        } else {
            Self::Bytes(bytes)
        }
    }

    /// Returns the JSON value if the body was decoded as JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the form fields if the body was decoded as a form.
    pub fn as_form(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Self::Form(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the undecoded bytes, if still raw.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::Text(t) => Some(t.as_bytes()),
            _ => None,
        }
    }
}

/// Response state of one request.
///
/// Once [`is_sent`](Self::is_sent) is true every mutator fails with
/// [`HandlerError::AlreadySent`].
#[derive(Debug, Clone, Default)]
pub struct ResponseState {
    sent: bool,
    response: Response,
}

impl ResponseState {
    /// Returns true once the response has been finalized.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Returns the response as built so far.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Sets the pending status code.
    pub fn set_status(&mut self, status: u16) -> Result<&mut Self, HandlerError> {
        self.guard()?;
        self.response.status = status;
        Ok(self)
    }

    /// Sets a pending header.
    pub fn set_header(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self, HandlerError> {
        self.guard()?;
        self.response.headers.insert(key.into(), value.into());
        Ok(self)
    }

    /// Appends bytes to the pending body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> Result<&mut Self, HandlerError> {
        self.guard()?;
        self.response.body.extend_from_slice(chunk.as_ref());
        Ok(self)
    }

    /// Finalizes whatever has been built so far.
    pub fn end(&mut self) -> Result<Flow, HandlerError> {
        self.guard()?;
        self.sent = true;
        Ok(Flow::done())
    }

    /// Finalizes with `response`.
    ///
    /// Headers set earlier through [`set_header`](Self::set_header) are kept
    /// unless `response` sets the same name.
    pub fn send(&mut self, response: Response) -> Result<Flow, HandlerError> {
        self.guard()?;
        let mut pending = std::mem::take(&mut self.response.headers);
        pending.retain(|k, _| response.get_header(k).is_none());
        self.response = response;
        self.response.headers.extend(pending);
        self.sent = true;
        Ok(Flow::done())
    }

    pub(crate) fn into_response(self) -> Response {
        self.response
    }

    fn guard(&self) -> Result<(), HandlerError> {
        if self.sent {
            Err(HandlerError::AlreadySent)
        } else {
            Ok(())
        }
    }
}

/// Everything a handler sees about the request in flight.
///
/// A context is created per inbound request and never shared across
/// requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request method.
    pub method: Method,
    /// Full request path, query string removed.
    pub raw_path: String,
    /// Raw query string, without the leading `?`.
    pub query_string: Option<String>,
    /// Decoded query parameters.
    pub query: IndexMap<String, String>,
    /// Parameters captured by the matched route.
    pub params: PathParams,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Body,
    /// Response under construction.
    pub response: ResponseState,
    base: String,
}

impl RequestContext {
    /// Creates a context from a method and a request target (`path?query`).
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query_string) = split_target(target);
        Self {
            method,
            raw_path: path.to_string(),
            query_string: query_string.map(str::to_string),
            query: query_string.map(parse_query_string).unwrap_or_default(),
            params: PathParams::new(),
            headers: HashMap::new(),
            body: Body::Empty,
            response: ResponseState::default(),
            base: String::new(),
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Gets a header value, ignoring case.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the media type of the request body, without parameters.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("Content-Type")
            .map(|v| v.split(';').next().unwrap_or(v).trim())
    }

    /// Gets a query parameter.
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Mount prefix under which the running handler was registered.
    pub fn base_path(&self) -> &str {
        &self.base
    }

    /// Path relative to the running handler's mount point.
    ///
    /// Always starts with `/`.
    pub fn path(&self) -> &str {
        let rest = self
            .raw_path
            .strip_prefix(self.base.as_str())
            .unwrap_or(&self.raw_path);
        if rest.is_empty() {
            "/"
        } else {
            rest
        }
    }

    /// Finalizes the response; shorthand for `self.response.send(response)`.
    pub fn send(&mut self, response: Response) -> Result<Flow, HandlerError> {
        self.response.send(response)
    }

    pub(crate) fn set_base(&mut self, base: &str) {
        base.clone_into(&mut self.base);
    }
}
