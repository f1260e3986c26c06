//! Table of contents stage.
//!
//! Builds a nested list of links to the slugged headings and splices it into
//! the document:
//!
//! - under a heading whose text matches `toc.heading` ("Contents",
//!   "Table of contents", ...), replacing that heading's section and listing
//!   only the headings after it;
//! - otherwise right after the first heading, listing every heading.
//!
//! Only top-level headings take part.

use crate::build::pipeline::context::TocSettings;
use crate::build::pipeline::document::{Block, DocumentTree, Heading, Inline, List, ListItem};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

/// Class carried by the generated list.
pub const TOC_CLASS: &str = "toc";

/// Stage that injects the table of contents.
pub struct TocStage;

impl Stage<DocumentTree, DocumentTree> for TocStage {
    fn name(&self) -> &'static str {
        "toc"
    }

    fn process(
        &self,
        input: DocumentTree,
        ctx: &PipelineContext,
    ) -> Result<DocumentTree, PipelineError> {
        let settings = &ctx.toc;
        let mut blocks = input.blocks;

        let Some(placement) = find_placement(&blocks, settings) else {
            return Ok(DocumentTree { blocks });
        };

        let entries = blocks[placement.list_from..]
            .iter()
            .filter_map(|block| match block {
                Block::Heading(heading) => TocEntry::from_heading(heading, settings),
                _ => None,
            })
            .collect::<Result<Vec<_>, _>>()?;

        if entries.is_empty() {
            return Ok(DocumentTree { blocks });
        }

        let toc = Block::List(List {
            start: settings.ordered.then_some(1),
            items: nest(&entries, settings.ordered),
            classes: vec![TOC_CLASS.to_string()],
        });
        blocks.drain(placement.replace.clone());
        blocks.insert(placement.replace.start, toc);

        Ok(DocumentTree { blocks })
    }
}

/// Where the list goes and which headings it covers.
struct Placement {
    /// Range of top-level blocks replaced by the list (empty to insert)
    replace: std::ops::Range<usize>,
    /// Headings from this top-level index onwards are listed
    list_from: usize,
}

fn find_placement(blocks: &[Block], settings: &TocSettings) -> Option<Placement> {
    let contents = blocks.iter().enumerate().find_map(|(index, block)| match block {
        Block::Heading(heading) if settings.heading.is_match(heading.plain_text().trim()) => {
            Some((index, heading.level))
        }
        _ => None,
    });

    if let Some((index, level)) = contents {
        let section_end = blocks[index + 1..]
            .iter()
            .position(|block| matches!(block, Block::Heading(h) if h.level <= level))
            .map_or(blocks.len(), |offset| index + 1 + offset);
        return Some(Placement {
            replace: index + 1..section_end,
            list_from: section_end,
        });
    }

    let first = blocks
        .iter()
        .position(|block| matches!(block, Block::Heading(_)))?;
    Some(Placement {
        replace: first + 1..first + 1,
        list_from: first,
    })
}

struct TocEntry {
    level: u8,
    id: String,
    text: String,
}

impl TocEntry {
    /// `None` for headings left out by depth or the skip pattern.
    fn from_heading(
        heading: &Heading,
        settings: &TocSettings,
    ) -> Option<Result<TocEntry, PipelineError>> {
        if heading.level > settings.max_depth {
            return None;
        }
        let text = heading.plain_text();
        if settings
            .skip
            .as_ref()
            .is_some_and(|skip| skip.is_match(text.trim()))
        {
            return None;
        }
        let Some(id) = heading.id.clone() else {
            return Some(Err(PipelineError::stage(
                "toc",
                format!("heading '{}' has no id (was the slug stage run?)", text),
            )));
        };
        Some(Ok(TocEntry {
            level: heading.level,
            id,
            text,
        }))
    }
}

/// Nest entries by heading level: deeper entries following an entry become
/// its children.
fn nest(entries: &[TocEntry], ordered: bool) -> Vec<ListItem> {
    let mut items = Vec::new();
    let mut index = 0;
    while index < entries.len() {
        let entry = &entries[index];
        let children_end = entries[index + 1..]
            .iter()
            .position(|next| next.level <= entry.level)
            .map_or(entries.len(), |offset| index + 1 + offset);

        let mut children = vec![Block::Plain(vec![Inline::Link {
            url: format!("#{}", entry.id),
            title: String::new(),
            children: vec![Inline::Text(entry.text.clone())],
        }])];
        if children_end > index + 1 {
            children.push(Block::List(List {
                start: ordered.then_some(1),
                items: nest(&entries[index + 1..children_end], ordered),
                classes: Vec::new(),
            }));
        }
        items.push(ListItem {
            checked: None,
            children,
        });
        index = children_end;
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::pipeline::PipelineConfig;
    use crate::build::pipeline::stages::{ParseStage, SlugStage};
    use crate::config::TocConfig;

    fn run(markdown: &str, toc: TocConfig) -> DocumentTree {
        let ctx = PipelineContext::new(&PipelineConfig {
            toc,
            ..Default::default()
        })
        .unwrap();
        let tree = ParseStage.process(markdown, &ctx).unwrap();
        let tree = SlugStage.process(tree, &ctx).unwrap();
        TocStage.process(tree, &ctx).unwrap()
    }

    fn toc_list(tree: &DocumentTree) -> &List {
        tree.blocks
            .iter()
            .find_map(|block| match block {
                Block::List(list) if list.classes == vec![TOC_CLASS.to_string()] => Some(list),
                _ => None,
            })
            .expect("document should contain a table of contents")
    }

    /// Flatten the list into (depth, href) pairs.
    fn links(list: &List) -> Vec<(usize, String)> {
        fn walk(list: &List, depth: usize, out: &mut Vec<(usize, String)>) {
            for item in &list.items {
                for block in &item.children {
                    match block {
                        Block::Plain(inlines) => {
                            for inline in inlines {
                                if let Inline::Link { url, .. } = inline {
                                    out.push((depth, url.clone()));
                                }
                            }
                        }
                        Block::List(nested) => walk(nested, depth + 1, out),
                        _ => {}
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(list, 0, &mut out);
        out
    }

    #[test]
    fn test_inserted_after_first_heading() {
        let tree = run(
            "# Hello\n\nSome text.\n\n## Hello\n",
            TocConfig::default(),
        );
        assert_eq!(tree.blocks.len(), 4);
        assert!(matches!(tree.blocks[0], Block::Heading(_)));
        let Block::List(list) = &tree.blocks[1] else {
            panic!("toc should follow the first heading");
        };
        assert_eq!(list.classes, vec![TOC_CLASS.to_string()]);
        assert_eq!(
            links(list),
            vec![(0, "#hello".to_string()), (1, "#hello-1".to_string())]
        );
    }

    #[test]
    fn test_contents_heading_replaces_its_section() {
        let tree = run(
            "# Guide\n\n## Contents\n\nstale\n\n## Install\n\n### Deep\n\n## Use\n",
            TocConfig::default(),
        );
        // h1, h2 Contents, toc, h2, h3, h2
        assert_eq!(tree.blocks.len(), 6);
        assert!(matches!(&tree.blocks[2], Block::List(_)));
        assert_eq!(
            links(toc_list(&tree)),
            vec![
                (0, "#install".to_string()),
                (1, "#deep".to_string()),
                (0, "#use".to_string()),
            ]
        );
    }

    #[test]
    fn test_contents_heading_never_lists_itself() {
        let tree = run("## Table of Contents\n\n## One\n", TocConfig::default());
        let hrefs: Vec<String> = links(toc_list(&tree)).into_iter().map(|(_, h)| h).collect();
        assert_eq!(hrefs, vec!["#one".to_string()]);
    }

    #[test]
    fn test_links_point_at_existing_ids() {
        let tree = run(
            "# A\n\n## B\n\n## B\n\n### C {#custom}\n",
            TocConfig::default(),
        );
        let ids: Vec<String> = tree
            .headings()
            .iter()
            .filter_map(|h| h.id.clone())
            .collect();
        for (_, href) in links(toc_list(&tree)) {
            let id = href.trim_start_matches('#');
            assert!(ids.iter().any(|existing| existing == id), "{href} dangles");
        }
    }

    #[test]
    fn test_max_depth_and_skip() {
        let tree = run(
            "# Top\n\n## Keep\n\n### Too deep\n\n## Changelog\n",
            TocConfig {
                max_depth: 2,
                skip: Some("^changelog$".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(
            links(toc_list(&tree)),
            vec![(0, "#top".to_string()), (1, "#keep".to_string())]
        );
    }

    #[test]
    fn test_ordered_list() {
        let tree = run(
            "# Top\n\n## Next\n",
            TocConfig {
                ordered: true,
                ..Default::default()
            },
        );
        assert_eq!(toc_list(&tree).start, Some(1));
    }

    #[test]
    fn test_no_headings_no_toc() {
        let tree = run("Just a paragraph.\n", TocConfig::default());
        assert_eq!(tree.blocks.len(), 1);
    }

    #[test]
    fn test_empty_contents_section_left_alone() {
        let tree = run("# Title\n\n## Contents\n\nnothing after\n", TocConfig::default());
        assert_eq!(tree.blocks.len(), 3);
        assert!(matches!(&tree.blocks[2], Block::Paragraph(_)));
    }

    #[test]
    fn test_unslugged_heading_is_a_stage_error() {
        let ctx = PipelineContext::new(&PipelineConfig::default()).unwrap();
        let tree = ParseStage.process("# No id yet\n", &ctx).unwrap();
        let err = TocStage.process(tree, &ctx).unwrap_err();
        assert!(matches!(err, PipelineError::Stage { ref stage, .. } if stage == "toc"));
    }
}
