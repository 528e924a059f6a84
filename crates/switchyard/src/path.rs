//! Path pattern compilation and matching.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{Result, RouterError};
use crate::request::{split_target, PathParams};

/// A segment in a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A literal string segment.
    Literal(String),
    /// A named parameter segment (e.g., `:id`).
    Param(String),
}

/// A compiled path pattern.
///
/// A pattern matches a path only when both have the same number of
/// non-empty segments; there is no catch-all suffix matching.
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The original pattern string.
    pattern: String,
    /// Parsed segments.
    segments: Vec<PathSegment>,
    /// Compiled regex for matching.
    regex: Regex,
    /// Parameter names in order.
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compiles a path pattern string.
    ///
    /// Pattern syntax:
    /// - `/users` - Literal path
    /// - `/users/:id` - Path with a named parameter
    ///
    /// A parameter name is the rest of the segment after `:`. It must be
    /// non-empty and unique within the pattern.
    ///
    /// # Example
    ///
    /// ```
    /// use switchyard::PathPattern;
    ///
    /// let pattern = PathPattern::compile("/posts/:id/comments/:comment_id").unwrap();
    /// let params = pattern.match_path("/posts/123/comments/456").unwrap();
    /// assert_eq!(params.get("id"), Some("123"));
    /// assert_eq!(params.get("comment_id"), Some("456"));
    /// ```
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut param_names: Vec<String> = Vec::new();
        let mut regex_str = String::from("^");

        for part in pattern.split('/').filter(|s| !s.is_empty()) {
            regex_str.push('/');

            if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouterError::pattern(pattern, "empty parameter name"));
                }
                if param_names.iter().any(|n| n == name) {
                    return Err(RouterError::pattern(
                        pattern,
                        format!("duplicate parameter name '{name}'"),
                    ));
                }
                segments.push(PathSegment::Param(name.to_string()));
                param_names.push(name.to_string());
                regex_str.push_str("([^/]+)");
            } else {
                if part.contains('?') {
                    return Err(RouterError::pattern(
                        pattern,
                        "query strings are not part of a pattern",
                    ));
                }
                segments.push(PathSegment::Literal(part.to_string()));
                regex_str.push_str(&regex::escape(part));
            }
        }

        regex_str.push_str("/?$");

        let regex = Regex::new(&regex_str)
            .map_err(|e| RouterError::pattern(pattern, e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            regex,
            param_names,
        })
    }

    /// Attempts to match a path against this pattern.
    ///
    /// Any `?query` suffix is ignored. Captured values are percent-decoded.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let (path, _) = split_target(path);
        let caps = self.regex.captures(path)?;

        let mut params = PathParams::new();
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(value) = caps.get(i + 1) {
                params.insert(name.clone(), decode_segment(value.as_str()));
            }
        }

        Some(params)
    }

    /// Returns the original pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the parameter names.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Generates a path from parameters.
    ///
    /// Values are percent-encoded. Returns `None` if a parameter is missing.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use switchyard::PathPattern;
    ///
    /// let pattern = PathPattern::compile("/posts/:id").unwrap();
    /// let params: HashMap<String, String> =
    ///     [("id".to_string(), "123".to_string())]
    ///     .into_iter()
    ///     .collect();
    /// let path = pattern.reverse(&params).unwrap();
    /// assert_eq!(path, "/posts/123");
    /// ```
    pub fn reverse(&self, params: &HashMap<String, String>) -> Option<String> {
        let mut path = String::new();

        for segment in &self.segments {
            path.push('/');
            match segment {
                PathSegment::Literal(s) => path.push_str(s),
                PathSegment::Param(name) => {
                    path.push_str(&urlencoding::encode(params.get(name)?));
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }

        Some(path)
    }
}

fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned())
}
