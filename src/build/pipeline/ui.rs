//! UI elements produced by the materialize stage.
//!
//! Materialization goes through an [`ElementFactory`], the element
//! construction function supplied by the caller. [`UiTreeFactory`] builds the
//! crate's own [`UiTree`], which the page shell renders to HTML.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::util::escape_html;

/// Element properties, keyed by property name (`className`, `htmlFor`, ...).
pub type Props = BTreeMap<String, String>;

/// Builds concrete UI nodes from markup elements.
pub trait ElementFactory {
    type Node;

    /// Create an element node from a tag, its properties and its children.
    fn create_element(&self, tag: &str, props: Props, children: Vec<Self::Node>) -> Self::Node;

    /// Create a text node.
    fn create_text(&self, text: &str) -> Self::Node;

    /// Create a node carrying raw HTML.
    fn create_raw(&self, html: &str) -> Self::Node;
}

/// A renderable UI node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UiNode {
    Element {
        tag: String,
        props: Props,
        children: Vec<UiNode>,
    },
    Text {
        value: String,
    },
    Raw {
        html: String,
    },
}

/// The final output of the pipeline: a fragment of top-level UI nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UiTree {
    pub children: Vec<UiNode>,
}

/// Void elements never get a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input"];

impl UiTree {
    /// Serialize the tree to an HTML fragment.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }
}

impl UiNode {
    fn write_html(&self, out: &mut String) {
        match self {
            UiNode::Text { value } => out.push_str(&escape_html(value)),
            UiNode::Raw { html } => out.push_str(html),
            UiNode::Element {
                tag,
                props,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in props {
                    out.push(' ');
                    out.push_str(attribute_name(name));
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_html(value));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// Map a markup attribute to the property name used on UI elements.
pub fn property_name(attribute: &str) -> &str {
    match attribute {
        "class" => "className",
        "for" => "htmlFor",
        "tabindex" => "tabIndex",
        other => other,
    }
}

/// Inverse of [`property_name`].
fn attribute_name(property: &str) -> &str {
    match property {
        "className" => "class",
        "htmlFor" => "for",
        "tabIndex" => "tabindex",
        other => other,
    }
}

/// Factory producing [`UiNode`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct UiTreeFactory;

impl ElementFactory for UiTreeFactory {
    type Node = UiNode;

    fn create_element(&self, tag: &str, props: Props, children: Vec<UiNode>) -> UiNode {
        UiNode::Element {
            tag: tag.to_string(),
            props,
            children,
        }
    }

    fn create_text(&self, text: &str) -> UiNode {
        UiNode::Text {
            value: text.to_string(),
        }
    }

    fn create_raw(&self, html: &str) -> UiNode {
        UiNode::Raw {
            html: html.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, props: &[(&str, &str)], children: Vec<UiNode>) -> UiNode {
        UiTreeFactory.create_element(
            tag,
            props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        )
    }

    #[test]
    fn test_to_html_escapes_text_and_maps_props() {
        let tree = UiTree {
            children: vec![element(
                "p",
                &[("className", "note")],
                vec![UiTreeFactory.create_text("1 < 2 & 3")],
            )],
        };
        assert_eq!(tree.to_html(), "<p class=\"note\">1 &lt; 2 &amp; 3</p>");
    }

    #[test]
    fn test_to_html_void_and_boolean_attributes() {
        let tree = UiTree {
            children: vec![element(
                "input",
                &[("checked", ""), ("disabled", ""), ("type", "checkbox")],
                vec![],
            )],
        };
        assert_eq!(tree.to_html(), "<input checked disabled type=\"checkbox\">");
    }

    #[test]
    fn test_raw_is_not_escaped() {
        let tree = UiTree {
            children: vec![UiTreeFactory.create_raw("<b>bold</b>")],
        };
        assert_eq!(tree.to_html(), "<b>bold</b>");
    }

    #[test]
    fn test_serializes_tagged_nodes() {
        let tree = UiTree {
            children: vec![UiTreeFactory.create_text("hi")],
        };
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["children"][0]["type"], "text");
        assert_eq!(json["children"][0]["value"], "hi");
    }

    #[test]
    fn test_property_name() {
        assert_eq!(property_name("class"), "className");
        assert_eq!(property_name("for"), "htmlFor");
        assert_eq!(property_name("href"), "href");
    }
}
