//! Slug stage.
//!
//! Gives every heading a unique, URL-safe id derived from its text.

use std::collections::{HashMap, HashSet};

use crate::build::pipeline::document::{Block, DocumentTree, Heading};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

/// Stage that assigns ids to headings.
///
/// Explicit ids (`## Title {#custom}`) are kept as written and reserved
/// before any id is generated. Generated ids that collide get a numeric
/// suffix: `hello`, `hello-1`, `hello-2`.
pub struct SlugStage;

impl Stage<DocumentTree, DocumentTree> for SlugStage {
    fn name(&self) -> &'static str {
        "slug"
    }

    fn process(
        &self,
        input: DocumentTree,
        _ctx: &PipelineContext,
    ) -> Result<DocumentTree, PipelineError> {
        let mut slugger = Slugger::default();
        for heading in input.headings() {
            if let Some(id) = &heading.id {
                slugger.reserve(id);
            }
        }

        Ok(DocumentTree {
            blocks: slug_blocks(input.blocks, &mut slugger),
        })
    }
}

fn slug_blocks(blocks: Vec<Block>, slugger: &mut Slugger) -> Vec<Block> {
    blocks
        .into_iter()
        .map(|block| match block {
            Block::Heading(heading) => {
                let id = match heading.id {
                    Some(id) => id,
                    None => slugger.slug(&heading.plain_text()),
                };
                Block::Heading(Heading {
                    id: Some(id),
                    ..heading
                })
            }
            Block::BlockQuote(children) => Block::BlockQuote(slug_blocks(children, slugger)),
            Block::List(mut list) => {
                list.items = list
                    .items
                    .into_iter()
                    .map(|mut item| {
                        item.children = slug_blocks(item.children, slugger);
                        item
                    })
                    .collect();
                Block::List(list)
            }
            other => other,
        })
        .collect()
}

/// Generates unique slugs within one document.
#[derive(Debug, Default)]
pub struct Slugger {
    used: HashSet<String>,
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    /// Mark an id as taken without generating it.
    pub fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    /// Slug `text`, appending `-N` until the result is unused.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut id = base.clone();
        while self.used.contains(&id) {
            let count = self.occurrences.entry(base.clone()).or_insert(0);
            *count += 1;
            id = format!("{}-{}", base, count);
        }
        self.used.insert(id.clone());
        id
    }
}

/// Convert a string to a slug suitable for use as an HTML id.
///
/// Lowercases, turns each whitespace character into `-` and drops anything
/// that is not alphanumeric, `-` or `_`.
pub fn slugify(s: &str) -> String {
    let slug: String = s
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect();

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}
