use crate::html::RenderNode;
use crate::models::Node;
use crate::schema::registry::{AttributeSpec, NodeSchema};

pub const DEFAULT_BUTTON_TEXT: &str = "Learn more";

/// Promo blocks are stored as `<div data-type="promo-block">` with every
/// field in a data attribute and a static card layout inside.
pub fn schema() -> NodeSchema {
    NodeSchema::atomic(view)
        .selector(r#"div[data-type="promo-block"]"#)
        .attribute(AttributeSpec::text("title", "data-title", ""))
        .attribute(AttributeSpec::text("description", "data-description", ""))
        .attribute(AttributeSpec::optional_text("location", "data-location"))
        .attribute(AttributeSpec::optional_text("date", "data-date"))
        .attribute(AttributeSpec::text(
            "buttonText",
            "data-button-text",
            DEFAULT_BUTTON_TEXT,
        ))
        .attribute(AttributeSpec::text("logoText", "data-logo-text", ""))
}

fn view(node: &Node, attrs: Vec<(String, String)>) -> RenderNode {
    let a = &node.attrs;
    let meta = [("promo-location", a.opt_text("location")), ("promo-date", a.opt_text("date"))]
        .into_iter()
        .filter_map(|(class, value)| {
            value.map(|v| {
                RenderNode::element("span")
                    .class(class)
                    .child(RenderNode::text(v))
            })
        });

    RenderNode::element("div")
        .attr("data-type", "promo-block")
        .class("promo-block")
        .attrs(attrs)
        .child_if(!a.text("logoText").is_empty(), || {
            RenderNode::element("div")
                .class("promo-logo")
                .child(RenderNode::text(a.text("logoText")))
        })
        .child(
            RenderNode::element("div")
                .class("promo-body")
                .child(RenderNode::element("h3").child(RenderNode::text(a.text("title"))))
                .child(RenderNode::element("p").child(RenderNode::text(a.text("description"))))
                .child(RenderNode::element("div").class("promo-meta").children(meta)),
        )
        .child(
            RenderNode::element("span")
                .class("promo-button")
                .child(RenderNode::text(a.text("buttonText"))),
        )
}
