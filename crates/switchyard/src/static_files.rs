//! Static file serving.
//!
//! [`StaticFiles`] is an ordinary handler, usually registered with
//! [`Router::middleware_at`](crate::Router::middleware_at). It answers with
//! the file found under its root, or continues so later routes at the same
//! mount point still get a chance.

use std::path::{Component, Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use tracing::debug;

use crate::context::RequestContext;
use crate::handler::{Handler, HandlerResult, Next};
use crate::request::Method;
use crate::response::Response;

/// Static file settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory files are served from.
    pub root: PathBuf,
    /// File served for directory requests.
    pub index: String,
    /// Whether files and directories starting with `.` are served.
    pub serve_dotfiles: bool,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
            index: "index.html".to_string(),
            serve_dotfiles: false,
        }
    }
}

/// Serves files from a directory, falling through when nothing is found.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    config: StaticFilesConfig,
}

impl StaticFiles {
    /// Serves files under `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(StaticFilesConfig {
            root: root.into(),
            ..StaticFilesConfig::default()
        })
    }

    /// Serves files as described by `config`.
    pub fn with_config(config: StaticFilesConfig) -> Self {
        Self { config }
    }

    /// Maps a request path to a file under the root.
    ///
    /// Returns `None` for paths that try to leave the root or that touch a
    /// hidden entry while dotfiles are disabled.
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let decoded = urlencoding::decode(request_path).ok()?;
        let mut path = self.config.root.clone();

        for component in Path::new(decoded.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => {
                    if !self.config.serve_dotfiles
                        && part.to_str().is_some_and(|s| s.starts_with('.'))
                    {
                        return None;
                    }
                    path.push(part);
                }
                Component::CurDir => {}
                _ => return None,
            }
        }

        Some(path)
    }

    async fn load(&self, request_path: &str) -> std::io::Result<Option<(Vec<u8>, PathBuf)>> {
        let Some(mut path) = self.resolve(request_path) else {
            return Ok(None);
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => path.push(&self.config.index),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        }

        match tokio::fs::read(&path).await {
            Ok(content) => Ok(Some((content, path))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Handler for StaticFiles {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        async move {
            if !matches!(ctx.method, Method::Get | Method::Head) {
                return Ok(next.proceed());
            }

            let Some((content, path)) = self.load(ctx.path()).await? else {
                debug!("no static file for {}", ctx.raw_path);
                return Ok(next.proceed());
            };

            let extension = path.extension().and_then(|e| e.to_str());
            let mut response = Response::ok()
                .header("Content-Type", content_type(extension))
                .header("Content-Length", content.len().to_string());
            if ctx.method == Method::Get {
                response = response.body(content);
            }
            ctx.send(response)
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "static-files"
    }
}

/// Returns the Content-Type for a file extension.
pub fn content_type(extension: Option<&str>) -> &'static str {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
