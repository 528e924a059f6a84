//! Request-side types: methods, path parameters and the raw inbound request.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET method
    Get,
    /// POST method
    Post,
    /// PUT method
    Put,
    /// PATCH method
    Patch,
    /// DELETE method
    Delete,
    /// HEAD method
    Head,
    /// OPTIONS method
    Options,
    /// CONNECT method
    Connect,
    /// TRACE method
    Trace,
}

impl Method {
    /// Parses a method from a string, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "CONNECT" => Some(Self::Connect),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    /// Returns the method as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The method side of a route registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodFilter {
    /// Matches every method.
    Any,
    /// Matches exactly one method.
    Only(Method),
}

impl MethodFilter {
    /// Returns true if `method` satisfies this filter.
    pub fn accepts(&self, method: Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(m) => *m == method,
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::Only(m) => m.fmt(f),
        }
    }
}

/// Path parameters captured by a route match.
///
/// Iteration order is the left-to-right order of the placeholders in the
/// pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: IndexMap<String, String>,
}

impl PathParams {
    /// Creates new empty path params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Gets a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Gets a parameter value or returns an error message.
    pub fn require(&self, key: &str) -> Result<&str, String> {
        self.get(key)
            .ok_or_else(|| format!("Missing path parameter: {key}"))
    }

    /// Parses a parameter as a specific type.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no parameters were captured.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns an iterator over the parameters in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the parameter names in capture order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// A request as handed over by the transport, before routing.
#[derive(Debug, Clone)]
pub struct RawRequest {
    /// Method verb as received.
    pub method: String,
    /// Request target: path plus optional `?query`.
    pub target: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Creates a new raw request.
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a GET request.
    pub fn get(target: impl Into<String>) -> Self {
        Self::new("GET", target)
    }

    /// Creates a POST request.
    pub fn post(target: impl Into<String>) -> Self {
        Self::new("POST", target)
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Splits a request target into its path and optional query string.
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Parses query parameters from a query string.
///
/// `+` decodes to a space and `%XX` escapes are resolved; undecodable pairs
/// keep their raw text.
pub fn parse_query_string(query: &str) -> IndexMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!(Method::parse("GET"), Some(Method::Get));
        assert_eq!(Method::parse("post"), Some(Method::Post));
        assert_eq!(Method::parse("INVALID"), None);
    }

    #[test]
    fn test_method_filter() {
        assert!(MethodFilter::Any.accepts(Method::Delete));
        assert!(MethodFilter::from(Method::Get).accepts(Method::Get));
        assert!(!MethodFilter::from(Method::Get).accepts(Method::Post));
        assert_eq!(MethodFilter::Any.to_string(), "ANY");
    }

    #[test]
    fn test_path_params_keep_insertion_order() {
        let mut params = PathParams::new();
        params.insert("post_id", "12");
        params.insert("comment_id", "7");
        params.insert("author", "phil");

        let keys: Vec<_> = params.keys().collect();
        assert_eq!(keys, ["post_id", "comment_id", "author"]);
        assert_eq!(params.parse::<i64>("post_id"), Some(12));
        assert_eq!(params.get("missing"), None);
        assert!(params.require("missing").is_err());
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target("/orders/12"), ("/orders/12", None));
        assert_eq!(
            split_target("/orders/12?format=json"),
            ("/orders/12", Some("format=json"))
        );
        assert_eq!(split_target("/?"), ("/", Some("")));
    }

    #[test]
    fn test_query_string_parsing() {
        let query = parse_query_string("name=John+Doe&age=30&city=New%20York&flag");
        assert_eq!(query.get("name").map(String::as_str), Some("John Doe"));
        assert_eq!(query.get("age").map(String::as_str), Some("30"));
        assert_eq!(query.get("city").map(String::as_str), Some("New York"));
        assert_eq!(query.get("flag").map(String::as_str), Some(""));
    }

    #[test]
    fn test_raw_request_builder() {
        let req = RawRequest::post("/users?x=1")
            .header("Content-Type", "application/json")
            .body("{}");
        assert_eq!(req.method, "POST");
        assert_eq!(req.target, "/users?x=1");
        assert_eq!(req.body, b"{}");
    }
}
