//! Configuration type definitions.
//!
//! This module contains all the data structures used in pagewright configuration files.
//! These types are pure data - no I/O or complex logic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// =============================================================================
// Site configuration
// =============================================================================

/// Site-level metadata, passed unchanged to the page shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    /// Default description for SEO tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Author handle, used for `twitter:creator`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Language of the page (`<html lang>`)
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

// =============================================================================
// Page configuration
// =============================================================================

/// The single page being rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// SEO title (falls back to front matter, then the file name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Markdown document, relative to the config file
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Location token handed to the page shell
    #[serde(default = "default_location")]
    pub location: String,
    /// Render a visible notice when the pipeline fails instead of a blank page
    #[serde(default)]
    pub show_errors: bool,
}

fn default_source() -> PathBuf {
    PathBuf::from("content/index.md")
}

fn default_location() -> String {
    "/".to_string()
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: None,
            source: default_source(),
            location: default_location(),
            show_errors: false,
        }
    }
}

impl PageConfig {
    /// Resolve the document path against a base path
    pub fn resolve_source(&self, base_path: &Path) -> PathBuf {
        if self.source.is_relative() {
            base_path.join(&self.source)
        } else {
            self.source.clone()
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
    /// Keep raw HTML from the document instead of dropping it
    #[serde(default)]
    pub allow_dangerous_html: bool,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "gfm".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
            allow_dangerous_html: false,
        }
    }
}

// =============================================================================
// Table of contents configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocConfig {
    /// Pattern (case-insensitive) for the heading the TOC is placed under.
    /// Defaults to "Contents", "Table of contents" or "TOC".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Deepest heading rank to list (1-6)
    #[serde(default = "default_max_depth")]
    pub max_depth: u8,
    /// Use an ordered list
    #[serde(default)]
    pub ordered: bool,
    /// Pattern (case-insensitive) for headings to leave out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
}

fn default_max_depth() -> u8 {
    6
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            heading: None,
            max_depth: default_max_depth(),
            ordered: false,
            skip: None,
        }
    }
}

// =============================================================================
// Highlight configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Pass code blocks with an unknown language through instead of failing
    #[serde(default = "default_ignore_missing")]
    pub ignore_missing: bool,
}

fn default_ignore_missing() -> bool {
    true
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            ignore_missing: default_ignore_missing(),
        }
    }
}

// =============================================================================
// Theme configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Theme directory containing `templates/**/*.html`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Stylesheet copied to `style.css` instead of the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<PathBuf>,
}

// =============================================================================
// Development configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// File watching configuration
    #[serde(default)]
    pub watch: WatchConfig,
    /// Enable live reload in the browser when files change (default: true)
    #[serde(default = "default_live_reload")]
    pub live_reload: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            live_reload: true,
        }
    }
}

fn default_live_reload() -> bool {
    true
}

/// Configuration for file watching during development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Use polling-based watcher instead of native file system events.
    /// Useful for network filesystems, Docker volumes, or other situations
    /// where native events are unreliable.
    #[serde(default)]
    pub poll: bool,
    /// Poll interval in milliseconds (only used if poll=true).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Debounce timeout in milliseconds.
    /// Changes within this window are batched together.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll: false,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}
