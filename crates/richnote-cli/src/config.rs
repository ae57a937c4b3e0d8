// SPDX-License-Identifier: AGPL-3.0-or-later
//! TOML configuration for the command-line front end

use anyhow::{Context, Result};
use richnote_core::{ParseConfig, RenderConfig, TablePolicy, DEFAULT_MAX_DEPTH};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "richnote.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Nesting limit for parsing and rendering
    pub max_depth: usize,
    /// Table detector answer when a tree is too deep to scan
    pub table_policy: TablePolicy,
    /// `tracing` filter directives, overridden by `RUST_LOG`
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            table_policy: TablePolicy::default(),
            log_filter: None,
        }
    }
}

impl Config {
    /// Load `path`, or `richnote.toml` if it exists, or the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse_config(&self) -> ParseConfig {
        ParseConfig {
            max_depth: self.max_depth,
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            max_depth: self.max_depth,
        }
    }
}
