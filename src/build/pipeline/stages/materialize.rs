//! Materialize stage: markup tree to UI nodes.

use crate::build::pipeline::markup::{MarkupNode, MarkupTree};
use crate::build::pipeline::ui::{ElementFactory, Props, property_name};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

/// Stage that builds UI nodes through the caller's [`ElementFactory`].
///
/// Attribute names are translated to property names on the way (`class`
/// becomes `className`).
pub struct MaterializeStage<'f, F> {
    factory: &'f F,
}

impl<'f, F: ElementFactory> MaterializeStage<'f, F> {
    pub fn new(factory: &'f F) -> Self {
        Self { factory }
    }

    fn node(&self, node: MarkupNode) -> F::Node {
        match node {
            MarkupNode::Element(element) => {
                let props: Props = element
                    .attributes
                    .into_iter()
                    .map(|(name, value)| (property_name(&name).to_string(), value))
                    .collect();
                let children = element
                    .children
                    .into_iter()
                    .map(|child| self.node(child))
                    .collect();
                self.factory.create_element(&element.tag, props, children)
            }
            MarkupNode::Text(text) => self.factory.create_text(&text),
            MarkupNode::Raw(html) => self.factory.create_raw(&html),
        }
    }
}

impl<F: ElementFactory> Stage<MarkupTree, Vec<F::Node>> for MaterializeStage<'_, F> {
    fn name(&self) -> &'static str {
        "materialize"
    }

    fn process(
        &self,
        input: MarkupTree,
        _ctx: &PipelineContext,
    ) -> Result<Vec<F::Node>, PipelineError> {
        Ok(input.children.into_iter().map(|node| self.node(node)).collect())
    }
}
