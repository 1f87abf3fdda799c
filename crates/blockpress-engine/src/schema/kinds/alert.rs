use crate::html::RenderNode;
use crate::models::{AlertKind, Node};
use crate::schema::registry::{AttributeSpec, NodeSchema};

/// Alerts are stored as `<div class="alert alert-info" data-type="INFO">`
/// with their title and body in data attributes and a rendered header.
pub fn schema() -> NodeSchema {
    NodeSchema::atomic(view)
        .selector("div.alert[data-type]")
        .attribute(AttributeSpec::choice::<AlertKind>("type", "data-type"))
        .attribute(AttributeSpec::text("title", "data-title", ""))
        .attribute(AttributeSpec::text("content", "data-content", ""))
}

pub fn kind(node: &Node) -> AlertKind {
    AlertKind::parse(node.attrs.text("type")).unwrap_or_default()
}

fn view(node: &Node, attrs: Vec<(String, String)>) -> RenderNode {
    let kind = kind(node);
    let title = node.attrs.opt_text("title").unwrap_or(kind.label());
    RenderNode::element("div")
        .class(format!("alert alert-{}", kind.as_str().to_ascii_lowercase()))
        .attrs(attrs)
        .attr("role", "note")
        .child(
            RenderNode::element("div")
                .class("alert-header")
                .child(
                    RenderNode::element("span")
                        .class("alert-icon")
                        .child(RenderNode::text(kind.icon())),
                )
                .child(
                    RenderNode::element("strong")
                        .class("alert-title")
                        .child(RenderNode::text(title)),
                ),
        )
        .child(
            RenderNode::element("div")
                .class("alert-content")
                .child(RenderNode::element("p").child(RenderNode::text(node.attrs.text("content")))),
        )
}
