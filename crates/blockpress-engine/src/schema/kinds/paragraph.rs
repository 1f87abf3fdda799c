use crate::html::RenderNode;
use crate::models::Node;
use crate::schema::inline::{parse_inline, render_inline};
use crate::schema::registry::NodeSchema;

pub fn schema() -> NodeSchema {
    NodeSchema::container(parse_inline, view).selector("p")
}

fn view(node: &Node, attrs: Vec<(String, String)>) -> RenderNode {
    RenderNode::element("p")
        .attrs(attrs)
        .children(render_inline(&node.content))
}
