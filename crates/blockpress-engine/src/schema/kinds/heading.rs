use crate::html::RenderNode;
use crate::models::Node;
use crate::schema::inline::{parse_inline, render_inline};
use crate::schema::registry::{AttrParse, AttributeSpec, NodeSchema};

pub const DEFAULT_LEVEL: u32 = 2;

pub fn schema() -> NodeSchema {
    NodeSchema::container(parse_inline, view)
        .selector("h1")
        .selector("h2")
        .selector("h3")
        .selector("h4")
        .selector("h5")
        .selector("h6")
        // The level is the tag itself, so it renders no wrapper attribute.
        .attribute(AttributeSpec::new(
            "level",
            DEFAULT_LEVEL,
            |el| match el.tag.strip_prefix('h').and_then(|n| n.parse::<u32>().ok()) {
                Some(level @ 1..=6) => AttrParse::Value(level.into()),
                _ => AttrParse::Missing,
            },
            |_| Vec::new(),
        ))
}

/// Heading level of `node`, clamped to `1..=6`.
pub fn level(node: &Node) -> u32 {
    node.attrs
        .number("level")
        .map_or(DEFAULT_LEVEL, |n| n.clamp(1.0, 6.0) as u32)
}

fn view(node: &Node, attrs: Vec<(String, String)>) -> RenderNode {
    RenderNode::element(format!("h{}", level(node)))
        .attrs(attrs)
        .children(render_inline(&node.content))
}
