//! Inline content of container blocks: marks in, marks out.

use crate::html::{DomNode, Element, RenderNode};
use crate::models::inline::normalize_runs;
use crate::models::{Inline, Mark};

/// Reads the inline content of a container element.
///
/// Recognized formatting elements become marks; any other element is
/// transparent and contributes its text. Runs are normalized.
pub fn parse_inline(element: &Element) -> Vec<Inline> {
    let mut out = Vec::new();
    collect(element, &mut Vec::new(), &mut out);
    normalize_runs(out)
}

fn collect(element: &Element, marks: &mut Vec<Mark>, out: &mut Vec<Inline>) {
    for child in &element.children {
        match child {
            DomNode::Text(text) => out.push(Inline::marked(text.clone(), marks.clone())),
            DomNode::Element(el) if el.tag == "br" => out.push(Inline::HardBreak),
            DomNode::Element(el) => match mark_for(el) {
                Some(mark) => {
                    marks.push(mark);
                    collect(el, marks, out);
                    marks.pop();
                }
                None => collect(el, marks, out),
            },
        }
    }
}

fn mark_for(element: &Element) -> Option<Mark> {
    let mark = match element.tag.as_str() {
        "strong" | "b" => Mark::Bold,
        "em" | "i" => Mark::Italic,
        "u" => Mark::Underline,
        "s" | "strike" | "del" => Mark::Strike,
        "code" => Mark::Code,
        "a" => Mark::Link {
            href: element.attr("href")?.to_string(),
        },
        _ => return None,
    };
    Some(mark)
}

/// Renders inline content, nesting marks in canonical order.
pub fn render_inline(content: &[Inline]) -> Vec<RenderNode> {
    content
        .iter()
        .map(|inline| match inline {
            Inline::HardBreak => RenderNode::element("br"),
            Inline::Text { text, marks } => marks
                .iter()
                .rev()
                .fold(RenderNode::text(text.clone()), |inner, mark| {
                    mark_element(mark).child(inner)
                }),
        })
        .collect()
}

fn mark_element(mark: &Mark) -> RenderNode {
    match mark {
        Mark::Link { href } => RenderNode::element("a").attr("href", href.clone()),
        Mark::Bold => RenderNode::element("strong"),
        Mark::Italic => RenderNode::element("em"),
        Mark::Underline => RenderNode::element("u"),
        Mark::Strike => RenderNode::element("s"),
        Mark::Code => RenderNode::element("code"),
    }
}
