//! Document tree produced by the parse stage.
//!
//! The tree mirrors markdown syntax: block nodes contain blocks or inline
//! runs, inline nodes contain inline nodes. Stages before the markup
//! conversion (`slug`, `toc`) take a tree and return a new one.

/// A parsed markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentTree {
    pub blocks: Vec<Block>,
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(Heading),
    Paragraph(Vec<Inline>),
    /// Inline content without a paragraph wrapper (tight list items)
    Plain(Vec<Inline>),
    BlockQuote(Vec<Block>),
    List(List),
    CodeBlock(CodeBlock),
    Html(String),
    Table(Table),
    ThematicBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Rank, 1-6
    pub level: u8,
    /// Anchor id. `None` until the slug stage runs, unless given explicitly.
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub children: Vec<Inline>,
}

impl Heading {
    /// The heading's text with all formatting stripped.
    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        for inline in &self.children {
            inline.collect_text(&mut text);
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    /// Start number for ordered lists, `None` for bullet lists
    pub start: Option<u64>,
    pub items: Vec<ListItem>,
    /// Extra classes (the generated table of contents is tagged `toc`)
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Task list state, `None` for regular items
    pub checked: Option<bool>,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag from the fence info string (first word only)
    pub lang: Option<String>,
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub head: Vec<Vec<Inline>>,
    pub rows: Vec<Vec<Vec<Inline>>>,
}

/// An inline node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link {
        url: String,
        title: String,
        children: Vec<Inline>,
    },
    Image {
        url: String,
        title: String,
        alt: Vec<Inline>,
    },
    Html(String),
    SoftBreak,
    HardBreak,
}

impl Inline {
    /// Append the node's visible text to `out`.
    pub fn collect_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Link { children, .. }
            | Inline::Image { alt: children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
            Inline::Html(_) => {}
        }
    }
}

impl DocumentTree {
    /// All headings in document order, including those nested in quotes and lists.
    pub fn headings(&self) -> Vec<&Heading> {
        fn walk<'a>(blocks: &'a [Block], out: &mut Vec<&'a Heading>) {
            for block in blocks {
                match block {
                    Block::Heading(heading) => out.push(heading),
                    Block::BlockQuote(children) => walk(children, out),
                    Block::List(list) => {
                        for item in &list.items {
                            walk(&item.children, out);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_plain_text_strips_formatting() {
        let heading = Heading {
            level: 2,
            id: None,
            classes: vec![],
            children: vec![
                Inline::Text("Using ".to_string()),
                Inline::Code("useEffect".to_string()),
                Inline::Emphasis(vec![Inline::Text(" well".to_string())]),
            ],
        };
        assert_eq!(heading.plain_text(), "Using useEffect well");
    }

    #[test]
    fn test_headings_walks_nested_blocks() {
        let heading = |text: &str| {
            Block::Heading(Heading {
                level: 2,
                id: None,
                classes: vec![],
                children: vec![Inline::Text(text.to_string())],
            })
        };
        let tree = DocumentTree {
            blocks: vec![
                heading("One"),
                Block::BlockQuote(vec![heading("Two")]),
                Block::Paragraph(vec![Inline::Text("text".to_string())]),
            ],
        };
        let texts: Vec<String> = tree.headings().iter().map(|h| h.plain_text()).collect();
        assert_eq!(texts, vec!["One", "Two"]);
    }
}
