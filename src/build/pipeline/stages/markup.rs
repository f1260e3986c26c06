//! Markup conversion stage.
//!
//! Maps the document tree onto generic HTML-shaped elements. Structure is
//! preserved one to one, except that tight list items lose their paragraph
//! wrapper and raw HTML is dropped unless explicitly allowed.

use crate::build::pipeline::document::{
    Alignment, Block, CodeBlock, DocumentTree, Inline, List, Table,
};
use crate::build::pipeline::markup::{Element, MarkupNode, MarkupTree};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

/// Stage that converts the document tree into a markup tree.
pub struct MarkupStage;

impl Stage<DocumentTree, MarkupTree> for MarkupStage {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn process(
        &self,
        input: DocumentTree,
        ctx: &PipelineContext,
    ) -> Result<MarkupTree, PipelineError> {
        let converter = Converter {
            allow_html: ctx.allow_dangerous_html,
        };
        Ok(MarkupTree {
            children: converter.blocks(input.blocks),
        })
    }
}

struct Converter {
    allow_html: bool,
}

impl Converter {
    fn blocks(&self, blocks: Vec<Block>) -> Vec<MarkupNode> {
        let mut nodes = Vec::with_capacity(blocks.len());
        for block in blocks {
            match block {
                Block::Heading(heading) => {
                    let mut element = Element::new(format!("h{}", heading.level));
                    if let Some(id) = heading.id {
                        element = element.with_attr("id", id);
                    }
                    for class in &heading.classes {
                        element.add_class(class);
                    }
                    nodes.push(element.with_children(self.inlines(heading.children)).into());
                }
                Block::Paragraph(inlines) => {
                    nodes.push(Element::new("p").with_children(self.inlines(inlines)).into());
                }
                Block::Plain(inlines) => nodes.extend(self.inlines(inlines)),
                Block::BlockQuote(children) => {
                    nodes.push(
                        Element::new("blockquote")
                            .with_children(self.blocks(children))
                            .into(),
                    );
                }
                Block::List(list) => nodes.push(self.list(list).into()),
                Block::CodeBlock(code) => nodes.push(code_block(code).into()),
                Block::Html(html) => {
                    if self.allow_html {
                        nodes.push(MarkupNode::Raw(html));
                    }
                }
                Block::Table(table) => nodes.push(self.table(table).into()),
                Block::ThematicBreak => nodes.push(Element::new("hr").into()),
            }
        }
        nodes
    }

    fn list(&self, list: List) -> Element {
        let mut element = match list.start {
            Some(1) => Element::new("ol"),
            Some(start) => Element::new("ol").with_attr("start", start.to_string()),
            None => Element::new("ul"),
        };
        for class in &list.classes {
            element.add_class(class);
        }
        if list.items.iter().any(|item| item.checked.is_some()) {
            element.add_class("contains-task-list");
        }

        let items = list
            .items
            .into_iter()
            .map(|item| {
                let mut li = Element::new("li");
                let mut children = Vec::new();
                if let Some(checked) = item.checked {
                    li.add_class("task-list-item");
                    let mut checkbox = Element::new("input")
                        .with_attr("type", "checkbox")
                        .with_attr("disabled", "");
                    if checked {
                        checkbox = checkbox.with_attr("checked", "");
                    }
                    children.push(checkbox.into());
                }
                children.extend(self.blocks(item.children));
                li.with_children(children).into()
            })
            .collect();

        element.with_children(items)
    }

    fn table(&self, table: Table) -> Element {
        let alignments = table.alignments;
        let row = |cells: Vec<Vec<Inline>>, tag: &str| -> MarkupNode {
            let cells = cells
                .into_iter()
                .enumerate()
                .map(|(index, cell)| {
                    let mut element = Element::new(tag);
                    if let Some(align) = alignments.get(index).and_then(|a| alignment_attr(*a)) {
                        element = element.with_attr("align", align);
                    }
                    element.with_children(self.inlines(cell)).into()
                })
                .collect();
            Element::new("tr").with_children(cells).into()
        };

        let mut children = vec![
            Element::new("thead")
                .with_children(vec![row(table.head, "th")])
                .into(),
        ];
        if !table.rows.is_empty() {
            let rows = table.rows.into_iter().map(|cells| row(cells, "td")).collect();
            children.push(Element::new("tbody").with_children(rows).into());
        }
        Element::new("table").with_children(children)
    }

    fn inlines(&self, inlines: Vec<Inline>) -> Vec<MarkupNode> {
        let mut nodes = Vec::with_capacity(inlines.len());
        for inline in inlines {
            match inline {
                Inline::Text(text) => nodes.push(MarkupNode::Text(text)),
                Inline::Code(code) => nodes.push(
                    Element::new("code")
                        .with_children(vec![MarkupNode::Text(code)])
                        .into(),
                ),
                Inline::Emphasis(children) => nodes.push(self.wrap("em", children)),
                Inline::Strong(children) => nodes.push(self.wrap("strong", children)),
                Inline::Strikethrough(children) => nodes.push(self.wrap("del", children)),
                Inline::Link {
                    url,
                    title,
                    children,
                } => {
                    let mut a = Element::new("a").with_attr("href", url);
                    if !title.is_empty() {
                        a = a.with_attr("title", title);
                    }
                    nodes.push(a.with_children(self.inlines(children)).into());
                }
                Inline::Image { url, title, alt } => {
                    let mut alt_text = String::new();
                    for inline in &alt {
                        inline.collect_text(&mut alt_text);
                    }
                    let mut img = Element::new("img")
                        .with_attr("src", url)
                        .with_attr("alt", alt_text);
                    if !title.is_empty() {
                        img = img.with_attr("title", title);
                    }
                    nodes.push(img.into());
                }
                Inline::Html(html) => {
                    if self.allow_html {
                        nodes.push(MarkupNode::Raw(html));
                    }
                }
                Inline::SoftBreak => nodes.push(MarkupNode::Text("\n".to_string())),
                Inline::HardBreak => nodes.push(Element::new("br").into()),
            }
        }
        nodes
    }

    fn wrap(&self, tag: &str, children: Vec<Inline>) -> MarkupNode {
        Element::new(tag)
            .with_children(self.inlines(children))
            .into()
    }
}

fn code_block(code: CodeBlock) -> Element {
    let mut inner = Element::new("code");
    if let Some(lang) = code.lang {
        inner.add_class(&format!("language-{lang}"));
    }
    Element::new("pre").with_children(vec![
        inner
            .with_children(vec![MarkupNode::Text(code.code)])
            .into(),
    ])
}

fn alignment_attr(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::pipeline::PipelineConfig;
    use crate::build::pipeline::stages::ParseStage;
    use crate::config::MarkdownConfig;

    fn convert_with(markdown: &str, config: PipelineConfig) -> Vec<MarkupNode> {
        let ctx = PipelineContext::new(&config).unwrap();
        let tree = ParseStage.process(markdown, &ctx).unwrap();
        MarkupStage.process(tree, &ctx).unwrap().children
    }

    fn convert(markdown: &str) -> Vec<MarkupNode> {
        convert_with(markdown, PipelineConfig::default())
    }

    fn el(node: &MarkupNode) -> &Element {
        match node {
            MarkupNode::Element(element) => element,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_block_structure_is_preserved() {
        let nodes = convert("# Title\n\nPara\n\n> quote\n\n---\n");
        let tags: Vec<&str> = nodes.iter().map(|n| el(n).tag.as_str()).collect();
        assert_eq!(tags, vec!["h1", "p", "blockquote", "hr"]);
    }

    #[test]
    fn test_code_block_shape() {
        let nodes = convert("```rust\nfn main() {}\n```");
        let pre = el(&nodes[0]);
        assert_eq!(pre.tag, "pre");
        let code = el(&pre.children[0]);
        assert_eq!(code.tag, "code");
        assert_eq!(
            code.attributes.get("class").map(String::as_str),
            Some("language-rust")
        );
        assert_eq!(code.children, vec![MarkupNode::Text("fn main() {}\n".to_string())]);
    }

    #[test]
    fn test_tight_list_items_have_no_paragraph() {
        let nodes = convert("- one\n- two\n");
        let ul = el(&nodes[0]);
        assert_eq!(ul.tag, "ul");
        let li = el(&ul.children[0]);
        assert_eq!(li.children, vec![MarkupNode::Text("one".to_string())]);
    }

    #[test]
    fn test_ordered_list_start_attribute() {
        let nodes = convert("1. a\n2. b\n\n---\n\n5. c\n");
        assert!(!el(&nodes[0]).attributes.contains_key("start"));
        assert_eq!(
            el(&nodes[2]).attributes.get("start").map(String::as_str),
            Some("5")
        );
    }

    #[test]
    fn test_task_items() {
        let nodes = convert("- [x] done\n- [ ] todo\n");
        let ul = el(&nodes[0]);
        assert!(ul.classes().any(|c| c == "contains-task-list"));
        let done = el(&ul.children[0]);
        assert!(done.classes().any(|c| c == "task-list-item"));
        let checkbox = el(&done.children[0]);
        assert_eq!(checkbox.tag, "input");
        assert!(checkbox.attributes.contains_key("checked"));
        let todo = el(&ul.children[1]);
        assert!(!el(&todo.children[0]).attributes.contains_key("checked"));
    }

    #[test]
    fn test_links_and_images() {
        let nodes = convert("[a](/x \"T\") ![alt *text*](/i.png)");
        let p = el(&nodes[0]);
        let a = el(&p.children[0]);
        assert_eq!(a.attributes.get("href").map(String::as_str), Some("/x"));
        assert_eq!(a.attributes.get("title").map(String::as_str), Some("T"));
        let img = el(&p.children[2]);
        assert_eq!(img.attributes.get("alt").map(String::as_str), Some("alt text"));
    }

    #[test]
    fn test_table_alignment() {
        let nodes = convert("| a | b |\n|:-:|---|\n| 1 | 2 |\n");
        let table = el(&nodes[0]);
        assert_eq!(table.tag, "table");
        let thead = el(&table.children[0]);
        let th = el(&el(&thead.children[0]).children[0]);
        assert_eq!(th.attributes.get("align").map(String::as_str), Some("center"));
        let tbody = el(&table.children[1]);
        let td = el(&el(&tbody.children[0]).children[1]);
        assert!(!td.attributes.contains_key("align"));
    }

    #[test]
    fn test_raw_html_dropped_by_default() {
        let nodes = convert("<div>x</div>\n\ntext <b>bold</b>\n");
        assert_eq!(nodes.len(), 1);
        let p = el(&nodes[0]);
        assert!(!p.children.iter().any(|n| matches!(n, MarkupNode::Raw(_))));
    }

    #[test]
    fn test_raw_html_kept_when_allowed() {
        let nodes = convert_with(
            "<div>x</div>\n",
            PipelineConfig {
                markdown: MarkdownConfig {
                    allow_dangerous_html: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        assert_eq!(nodes, vec![MarkupNode::Raw("<div>x</div>\n".to_string())]);
    }

    #[test]
    fn test_heading_id_and_classes() {
        let mut config = PipelineConfig::default();
        config
            .markdown
            .extensions
            .push("heading_attributes".to_string());
        let nodes = convert_with("## Setup {#install .wide}", config);
        let h2 = el(&nodes[0]);
        assert_eq!(h2.attributes.get("id").map(String::as_str), Some("install"));
        assert_eq!(h2.attributes.get("class").map(String::as_str), Some("wide"));
    }
}
