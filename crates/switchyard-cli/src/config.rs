//! Configuration file loading.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use switchyard::{DispatcherConfig, StaticFilesConfig};

/// Contents of the TOML configuration file.
///
/// ```toml
/// [dispatcher]
/// not_found_body = "nothing here"
///
/// [static_files]
/// root = "site"
/// serve_dotfiles = false
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub dispatcher: DispatcherConfig,
    pub static_files: StaticFilesConfig,
}

impl AppConfig {
    /// Loads the file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}
