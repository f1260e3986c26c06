//! Highlight stage.
//!
//! Finds `pre > code` blocks tagged with a `language-*` class and splits
//! their text into `span.token` elements. Blocks without a language are left
//! alone; blocks in an unknown language are left alone too unless
//! `highlight.ignore_missing` is off.

use crate::build::highlight::Token;
use crate::build::pipeline::markup::{Element, MarkupNode, MarkupTree};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

const LANGUAGE_PREFIX: &str = "language-";

/// Stage that tokenizes code blocks.
pub struct HighlightStage;

impl Stage<MarkupTree, MarkupTree> for HighlightStage {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn process(
        &self,
        input: MarkupTree,
        ctx: &PipelineContext,
    ) -> Result<MarkupTree, PipelineError> {
        Ok(MarkupTree {
            children: highlight_nodes(input.children, ctx)?,
        })
    }
}

fn highlight_nodes(
    nodes: Vec<MarkupNode>,
    ctx: &PipelineContext,
) -> Result<Vec<MarkupNode>, PipelineError> {
    nodes
        .into_iter()
        .map(|node| match node {
            MarkupNode::Element(element) if element.tag == "pre" => {
                highlight_pre(element, ctx).map(MarkupNode::Element)
            }
            MarkupNode::Element(mut element) => {
                element.children = highlight_nodes(element.children, ctx)?;
                Ok(MarkupNode::Element(element))
            }
            other => Ok(other),
        })
        .collect()
}

fn highlight_pre(mut pre: Element, ctx: &PipelineContext) -> Result<Element, PipelineError> {
    let Some(MarkupNode::Element(code)) = pre.children.first_mut() else {
        return Ok(pre);
    };
    if code.tag != "code" {
        return Ok(pre);
    }
    let Some(lang) = language(code) else {
        return Ok(pre);
    };

    let text = code.text_content();
    if text.is_empty() {
        return Ok(pre);
    }

    let tokens = ctx
        .highlighter
        .tokenize(&text, &lang)
        .map_err(|e| PipelineError::stage("highlight", format!("{lang}: {e}")))?;

    let Some(tokens) = tokens else {
        if ctx.ignore_missing {
            tracing::debug!(language = %lang, "no grammar for code block, leaving it plain");
            return Ok(pre);
        }
        return Err(PipelineError::stage(
            "highlight",
            format!("unknown language: {lang}"),
        ));
    };

    code.children = tokens.into_iter().map(token_node).collect();
    pre.add_class(&format!("{LANGUAGE_PREFIX}{lang}"));
    Ok(pre)
}

fn language(code: &Element) -> Option<String> {
    code.classes()
        .find_map(|class| class.strip_prefix(LANGUAGE_PREFIX))
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

fn token_node(token: Token) -> MarkupNode {
    match token.kind {
        Some(kind) => Element::new("span")
            .with_attr("class", format!("token {}", kind.class()))
            .with_children(vec![MarkupNode::Text(token.text)])
            .into(),
        None => MarkupNode::Text(token.text),
    }
}
