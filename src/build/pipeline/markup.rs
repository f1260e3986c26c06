//! Markup tree: a generic element tree independent of markdown syntax.

use std::collections::BTreeMap;

/// A node in the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(Element),
    Text(String),
    /// Raw HTML carried through untouched
    Raw(String),
}

/// An element with a tag name, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<MarkupNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<MarkupNode>) -> Self {
        self.children = children;
        self
    }

    /// Space-separated class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }

    /// Add a class unless it is already present.
    pub fn add_class(&mut self, class: &str) {
        if self.classes().any(|c| c == class) {
            return;
        }
        self.attributes
            .entry("class".to_string())
            .and_modify(|existing| {
                existing.push(' ');
                existing.push_str(class);
            })
            .or_insert_with(|| class.to_string());
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[MarkupNode], out: &mut String) {
    for node in nodes {
        match node {
            MarkupNode::Text(text) => out.push_str(text),
            MarkupNode::Element(element) => collect_text(&element.children, out),
            MarkupNode::Raw(_) => {}
        }
    }
}

impl From<Element> for MarkupNode {
    fn from(element: Element) -> Self {
        MarkupNode::Element(element)
    }
}

/// The markup tree for a whole document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupTree {
    pub children: Vec<MarkupNode>,
}
