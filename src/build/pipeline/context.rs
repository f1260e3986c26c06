//! Pipeline configuration and the compiled resources shared across stages.

use pulldown_cmark::Options;
use regex::{Regex, RegexBuilder};

use crate::build::highlight::SyntaxHighlighter;
use crate::build::pipeline::PipelineError;
use crate::config::{Config, HighlightConfig, MarkdownConfig, TocConfig};

/// Heading text that marks where the table of contents goes.
const DEFAULT_TOC_HEADING: &str = "^(table[ -]of[ -])?contents?$|^toc$";

/// Immutable stage configuration, constructed once at startup and handed to
/// [`Pipeline::new`](super::Pipeline::new).
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub markdown: MarkdownConfig,
    pub toc: TocConfig,
    pub highlight: HighlightConfig,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            markdown: config.markdown.clone(),
            toc: config.toc.clone(),
            highlight: config.highlight.clone(),
        }
    }
}

/// Compiled table of contents settings.
pub struct TocSettings {
    pub heading: Regex,
    pub skip: Option<Regex>,
    pub max_depth: u8,
    pub ordered: bool,
}

/// Shared context for pipeline stages.
///
/// Everything here is derived from [`PipelineConfig`] when the pipeline is
/// built and never changes afterwards.
pub struct PipelineContext {
    /// Parser extensions
    pub options: Options,
    /// Keep raw HTML nodes during markup conversion
    pub allow_dangerous_html: bool,
    pub toc: TocSettings,
    /// Syntax highlighter for code blocks
    pub highlighter: SyntaxHighlighter,
    /// Let unknown code languages through unhighlighted
    pub ignore_missing: bool,
}

impl PipelineContext {
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            options: parser_options(&config.markdown)?,
            allow_dangerous_html: config.markdown.allow_dangerous_html,
            toc: toc_settings(&config.toc)?,
            highlighter: SyntaxHighlighter::default(),
            ignore_missing: config.highlight.ignore_missing,
        })
    }
}

/// Map extension names to pulldown-cmark options.
fn parser_options(config: &MarkdownConfig) -> Result<Options, PipelineError> {
    let mut options = Options::empty();
    for extension in &config.extensions {
        match extension.as_str() {
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => {
                return Err(PipelineError::Config(format!(
                    "invalid markdown extension: {other}"
                )));
            }
        }
    }
    Ok(options)
}

fn toc_settings(config: &TocConfig) -> Result<TocSettings, PipelineError> {
    let heading = compile_pattern(
        "toc.heading",
        config.heading.as_deref().unwrap_or(DEFAULT_TOC_HEADING),
    )?;
    let skip = config
        .skip
        .as_deref()
        .map(|pattern| compile_pattern("toc.skip", pattern))
        .transpose()?;

    Ok(TocSettings {
        heading,
        skip,
        max_depth: config.max_depth.clamp(1, 6),
        ordered: config.ordered,
    })
}

fn compile_pattern(field: &str, pattern: &str) -> Result<Regex, PipelineError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| PipelineError::Config(format!("invalid '{field}' pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context() {
        let ctx = PipelineContext::new(&PipelineConfig::default()).unwrap();
        assert!(ctx.options.contains(Options::ENABLE_TABLES));
        assert!(ctx.options.contains(Options::ENABLE_TASKLISTS));
        assert!(!ctx.allow_dangerous_html);
        assert!(ctx.ignore_missing);
        assert_eq!(ctx.toc.max_depth, 6);
    }

    #[test]
    fn test_default_toc_heading_pattern() {
        let ctx = PipelineContext::new(&PipelineConfig::default()).unwrap();
        for text in ["Contents", "Table of Contents", "table-of-contents", "TOC", "content"] {
            assert!(ctx.toc.heading.is_match(text), "{text} should match");
        }
        for text in ["Introduction", "Contents of the box"] {
            assert!(!ctx.toc.heading.is_match(text), "{text} should not match");
        }
    }

    #[test]
    fn test_invalid_extension() {
        let config = PipelineConfig {
            markdown: MarkdownConfig {
                extensions: vec!["not_a_real_extension".to_string()],
                allow_dangerous_html: false,
            },
            ..Default::default()
        };
        let result = PipelineContext::new(&config);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_invalid_skip_pattern() {
        let config = PipelineConfig {
            toc: TocConfig {
                skip: Some("(".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let result = PipelineContext::new(&config);
        assert!(matches!(result, Err(PipelineError::Config(msg)) if msg.contains("toc.skip")));
    }
}
