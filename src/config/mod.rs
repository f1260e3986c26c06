//! Configuration loading and types for pagewright.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use load::{DEFAULT_CONFIG_FILE, base_path_from_config};
// Re-export all types for convenient access
pub use types::{
    DevConfig, HighlightConfig, MarkdownConfig, PageConfig, SiteConfig, ThemeConfig, TocConfig,
    WatchConfig,
};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("{0}")]
    Validation(String),
}

// =============================================================================
// Top-level config
// =============================================================================

/// The contents of `pagewright.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub toc: TocConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Development-specific settings (watch mode, etc.)
    #[serde(default)]
    pub dev: DevConfig,
}

impl Config {
    /// Check the values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "invalid config: 'site.title' must not be empty".to_string(),
            ));
        }
        if !(1..=6).contains(&self.toc.max_depth) {
            return Err(ConfigError::Validation(format!(
                "invalid config: 'toc.max_depth' must be between 1 and 6, got {}",
                self.toc.max_depth
            )));
        }
        if !self.page.location.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "invalid config: 'page.location' must start with '/', got '{}'",
                self.page.location
            )));
        }
        Ok(())
    }
}

/// Format a deserialization error with helpful context
fn format_config_error(e: config::ConfigError) -> ConfigError {
    let msg = e.to_string();

    if msg.contains("missing field `site`") {
        return ConfigError::Validation(
            "invalid config: 'site' is required\n\nExample:\n  site:\n    title: My Book"
                .to_string(),
        );
    }
    if msg.contains("missing field `title`") {
        return ConfigError::Validation(
            "invalid config: missing required 'site.title' field".to_string(),
        );
    }

    ConfigError::Deserialize(e)
}
