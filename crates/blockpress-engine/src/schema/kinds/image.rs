use crate::html::{Element, RenderNode};
use crate::models::{Align, AttrValue, Node};
use crate::schema::registry::{AttrParse, AttributeSpec, NodeSchema, parse_positive};

/// Images are stored as a `<figure data-type="image">` around the `<img>`.
/// The `<img>` carries source, alt text and size; layout lives on the figure.
/// A bare `<img>` is accepted as well.
pub fn schema() -> NodeSchema {
    NodeSchema::atomic(view)
        .selector(r#"figure[data-type="image"]"#)
        .selector("img")
        .attribute(img_text("src"))
        .attribute(img_text("alt"))
        .attribute(img_dimension("width"))
        .attribute(img_dimension("height"))
        .attribute(AttributeSpec::choice::<Align>("align", "data-align"))
        .attribute(AttributeSpec::number(
            "aspectRatio",
            "data-aspect-ratio",
            None,
        ))
        .attribute(AttributeSpec::flag(
            "aspectLocked",
            "data-aspect-locked",
            true,
        ))
        .discard_when(|node| node.attrs.opt_text("src").is_none())
}

/// Text attribute read from the inner `<img>`; rendered by the view.
fn img_text(name: &'static str) -> AttributeSpec {
    AttributeSpec::new(
        name,
        "",
        move |el: &Element| match el.locate("img").and_then(|img| img.attr(name)) {
            Some(raw) => AttrParse::Value(raw.into()),
            None => AttrParse::Missing,
        },
        |_| Vec::new(),
    )
}

fn img_dimension(name: &'static str) -> AttributeSpec {
    AttributeSpec::new(
        name,
        AttrValue::Null,
        move |el: &Element| match el.locate("img").and_then(|img| img.attr(name)) {
            None => AttrParse::Missing,
            Some(raw) => match parse_positive(raw) {
                Some(n) => AttrParse::Value(n.round().into()),
                None => AttrParse::Invalid(format!("`{raw}` is not a positive size")),
            },
        },
        |_| Vec::new(),
    )
}

fn view(node: &Node, attrs: Vec<(String, String)>) -> RenderNode {
    let align = Align::parse(node.attrs.text("align")).unwrap_or_default();
    let img = RenderNode::element("img")
        .attr("src", node.attrs.text("src"))
        .attr("alt", node.attrs.text("alt"))
        .attr_opt("width", node.attrs.number("width").map(|n| n.to_string()))
        .attr_opt("height", node.attrs.number("height").map(|n| n.to_string()));
    RenderNode::element("figure")
        .attr("data-type", "image")
        .class(format!("image-node image-align-{align}"))
        .attrs(attrs)
        .child(img)
}
