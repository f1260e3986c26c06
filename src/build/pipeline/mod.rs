//! Markdown rendering pipeline.
//!
//! The pipeline turns raw markdown into a UI tree through a fixed chain of
//! stages. Each stage's output is the next stage's input:
//!
//! 1. **parse** - markdown text to a document tree
//! 2. **slug** - assign a unique id to every heading
//! 3. **toc** - inject a table of contents linking to those ids
//! 4. **markup** - document tree to a generic markup tree
//! 5. **highlight** - split code blocks into classified token spans
//! 6. **materialize** - markup tree to UI nodes through an [`ElementFactory`]
//!
//! The order is part of the contract (the TOC can only link to slugged
//! headings, highlighting only sees markup), so the chain is not
//! configurable. What each stage does is configured once through
//! [`PipelineConfig`]. A failing stage aborts the rest of the run.

mod context;
mod document;
mod error;
mod markup;
mod stages;
mod ui;

pub use context::{PipelineConfig, PipelineContext};
pub use error::{ParseError, PipelineError};
pub use ui::{ElementFactory, UiTree, UiTreeFactory};

use stages::{HighlightStage, MarkupStage, MaterializeStage, ParseStage, SlugStage, TocStage};

/// A stage in the markdown pipeline.
///
/// Stages are pure: they consume their input and return a new value, reading
/// only the shared, immutable [`PipelineContext`].
pub trait Stage<I, O> {
    /// Unique name for this stage (used in errors and diagnostics).
    fn name(&self) -> &'static str;

    /// Transform the previous stage's output.
    fn process(&self, input: I, ctx: &PipelineContext) -> Result<O, PipelineError>;
}

/// Stage names in execution order.
pub const STAGE_NAMES: [&str; 6] = ["parse", "slug", "toc", "markup", "highlight", "materialize"];

/// The markdown pipeline.
///
/// Built once from a [`PipelineConfig`]; rendering never mutates it, so a
/// single pipeline can be shared across threads.
pub struct Pipeline {
    ctx: PipelineContext,
}

impl Pipeline {
    /// Build the pipeline, compiling everything the stages need up front.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            ctx: PipelineContext::new(&config)?,
        })
    }

    /// Render markdown into the crate's own [`UiTree`].
    pub fn render(&self, raw: &str) -> Result<UiTree, PipelineError> {
        let children = self.render_with(raw, &UiTreeFactory)?;
        Ok(UiTree { children })
    }

    /// Render markdown into top-level nodes built by `factory`.
    pub fn render_with<F: ElementFactory>(
        &self,
        raw: &str,
        factory: &F,
    ) -> Result<Vec<F::Node>, PipelineError> {
        let tree = self.run_stage(&ParseStage, raw)?;
        let tree = self.run_stage(&SlugStage, tree)?;
        let tree = self.run_stage(&TocStage, tree)?;
        let markup = self.run_stage(&MarkupStage, tree)?;
        let markup = self.run_stage(&HighlightStage, markup)?;
        self.run_stage(&MaterializeStage::new(factory), markup)
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> &'static [&'static str] {
        &STAGE_NAMES
    }

    fn run_stage<I, O, S: Stage<I, O>>(&self, stage: &S, input: I) -> Result<O, PipelineError> {
        tracing::debug!(stage = stage.name(), "running pipeline stage");
        stage.process(input, &self.ctx).inspect_err(|e| {
            tracing::debug!(stage = stage.name(), error = %e, "pipeline stage failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HighlightConfig;
    use super::document::DocumentTree;
    use super::markup::MarkupTree;
    use super::ui::{Props, UiNode};

    const SCENARIO: &str = "# Hello\n\nSome text.\n\n## Hello\n\n```js\nconst x = 1;\n```";

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default()).unwrap()
    }

    fn element<'a>(node: &'a UiNode) -> (&'a str, &'a Props, &'a [UiNode]) {
        match node {
            UiNode::Element {
                tag,
                props,
                children,
            } => (tag.as_str(), props, children.as_slice()),
            other => panic!("expected element, got {other:?}"),
        }
    }

    fn text_of(nodes: &[UiNode]) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                UiNode::Text { value } => out.push_str(value),
                UiNode::Element { children, .. } => out.push_str(&text_of(children)),
                UiNode::Raw { .. } => {}
            }
        }
        out
    }

    fn find_all<'a>(nodes: &'a [UiNode], tag: &str, out: &mut Vec<&'a UiNode>) {
        for node in nodes {
            if let UiNode::Element {
                tag: t, children, ..
            } = node
            {
                if t == tag {
                    out.push(node);
                }
                find_all(children, tag, out);
            }
        }
    }

    #[test]
    fn test_stage_names_match_stages() {
        let names = [
            Stage::<&str, DocumentTree>::name(&ParseStage),
            Stage::<DocumentTree, DocumentTree>::name(&SlugStage),
            Stage::<DocumentTree, DocumentTree>::name(&TocStage),
            Stage::<DocumentTree, MarkupTree>::name(&MarkupStage),
            Stage::<MarkupTree, MarkupTree>::name(&HighlightStage),
            Stage::<MarkupTree, Vec<UiNode>>::name(&MaterializeStage::new(&UiTreeFactory)),
        ];
        assert_eq!(names, STAGE_NAMES);
        assert_eq!(pipeline().stage_names(), &STAGE_NAMES);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let tree = pipeline().render(SCENARIO).unwrap();

        // h1, toc, p, h2, pre
        assert_eq!(tree.children.len(), 5);

        let (tag, props, children) = element(&tree.children[0]);
        assert_eq!(tag, "h1");
        assert_eq!(props.get("id").map(String::as_str), Some("hello"));
        assert_eq!(text_of(children), "Hello");

        let (tag, props, _) = element(&tree.children[1]);
        assert_eq!(tag, "ul");
        assert_eq!(props.get("className").map(String::as_str), Some("toc"));
        let mut links = Vec::new();
        find_all(&tree.children[1..2], "a", &mut links);
        let hrefs: Vec<&str> = links
            .iter()
            .map(|link| element(link).1.get("href").map(String::as_str).unwrap_or(""))
            .collect();
        assert_eq!(hrefs, vec!["#hello", "#hello-1"]);

        let (tag, _, children) = element(&tree.children[2]);
        assert_eq!(tag, "p");
        assert_eq!(text_of(children), "Some text.");

        let (tag, props, _) = element(&tree.children[3]);
        assert_eq!(tag, "h2");
        assert_eq!(props.get("id").map(String::as_str), Some("hello-1"));

        let (tag, _, children) = element(&tree.children[4]);
        assert_eq!(tag, "pre");
        assert_eq!(text_of(children), "const x = 1;\n");
        let mut spans = Vec::new();
        find_all(children, "span", &mut spans);
        assert!(spans.iter().any(|span| {
            let (_, props, children) = element(span);
            props.get("className").map(String::as_str) == Some("token keyword")
                && text_of(children) == "const"
        }));
    }

    #[test]
    fn test_top_level_count_without_toc() {
        let tree = pipeline()
            .render("Intro paragraph.\n\n- one\n- two\n\n---\n\n> quoted")
            .unwrap();
        assert_eq!(tree.children.len(), 4);
    }

    #[test]
    fn test_render_is_idempotent() {
        let pipeline = pipeline();
        let first = pipeline.render(SCENARIO).unwrap();
        let second = pipeline.render(SCENARIO).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_html(), second.to_html());
    }

    #[test]
    fn test_plain_code_passes_through() {
        let code = "let <b> = \"&\";\n";
        let raw = format!("```\n{code}```\n\n```nosuchlang\n{code}```");
        let tree = pipeline().render(&raw).unwrap();
        assert_eq!(tree.children.len(), 2);
        for node in &tree.children {
            let (tag, _, children) = element(node);
            assert_eq!(tag, "pre");
            let (code_tag, _, code_children) = element(&children[0]);
            assert_eq!(code_tag, "code");
            assert_eq!(
                code_children,
                &[UiNode::Text {
                    value: code.to_string()
                }]
            );
        }
    }

    #[test]
    fn test_unknown_language_fails_when_not_ignored() {
        let pipeline = Pipeline::new(PipelineConfig {
            highlight: HighlightConfig {
                ignore_missing: false,
            },
            ..Default::default()
        })
        .unwrap();
        let err = pipeline.render("```nosuchlang\nx\n```").unwrap_err();
        assert!(matches!(err, PipelineError::Stage { ref stage, .. } if stage == "highlight"));
    }

    #[test]
    fn test_render_with_custom_factory() {
        struct TagCounter;
        impl ElementFactory for TagCounter {
            type Node = usize;
            fn create_element(&self, _tag: &str, _props: Props, children: Vec<usize>) -> usize {
                1 + children.iter().sum::<usize>()
            }
            fn create_text(&self, _text: &str) -> usize {
                0
            }
            fn create_raw(&self, _html: &str) -> usize {
                0
            }
        }

        let counts = pipeline()
            .render_with("Plain *emphasis*.", &TagCounter)
            .unwrap();
        // p > em
        assert_eq!(counts, vec![2]);
    }

    #[test]
    fn test_empty_document() {
        let tree = pipeline().render("").unwrap();
        assert!(tree.children.is_empty());
    }
}
