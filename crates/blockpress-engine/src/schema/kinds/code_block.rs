use crate::html::{Element, RenderNode};
use crate::models::{CodeLanguage, Inline, Node};
use crate::schema::registry::{AttrParse, AttributeSpec, NodeSchema};

/// Code blocks are stored as
/// `<div data-type="code-block"><div class="code-block-header">..</div><pre><code class="language-x">..</code></pre></div>`.
/// A bare `<pre>` from other editors is accepted too, taking its language
/// from a `language-*` class.
pub fn schema() -> NodeSchema {
    NodeSchema::container(parse_code, view)
        .selector(r#"div[data-type="code-block"]"#)
        .selector("pre")
        .attribute(AttributeSpec::new(
            "language",
            CodeLanguage::default().as_str(),
            parse_language,
            |value| match value.as_text() {
                Some(lang) => vec![("data-language".to_string(), lang.to_string())],
                None => Vec::new(),
            },
        ))
        .attribute(AttributeSpec::flag(
            "showLanguageBar",
            "data-show-language-bar",
            true,
        ))
}

pub fn language(node: &Node) -> CodeLanguage {
    CodeLanguage::parse(node.attrs.text("language")).unwrap_or_default()
}

fn parse_language(el: &Element) -> AttrParse {
    if let Some(raw) = el.attr("data-language") {
        return match CodeLanguage::from_alias(raw) {
            Some(lang) => AttrParse::Value(lang.as_str().into()),
            None => AttrParse::Invalid(format!("unknown language `{raw}`")),
        };
    }
    let class_language = el
        .locate("code")
        .into_iter()
        .chain(el.locate("pre"))
        .flat_map(|el| el.classes())
        .find_map(|class| class.strip_prefix("language-"));
    match class_language.map(|raw| (raw, CodeLanguage::from_alias(raw))) {
        Some((_, Some(lang))) => AttrParse::Value(lang.as_str().into()),
        Some((raw, None)) => AttrParse::Invalid(format!("unknown language class `{raw}`")),
        None => AttrParse::Missing,
    }
}

/// Code text, taken from the `<pre>` so the language bar never leaks in.
fn parse_code(el: &Element) -> Vec<Inline> {
    let text = el.locate("pre").map(Element::text_content).unwrap_or_default();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Inline::text(text)]
    }
}

fn view(node: &Node, attrs: Vec<(String, String)>) -> RenderNode {
    let lang = language(node);
    let show_bar = node.attrs.flag("showLanguageBar");
    RenderNode::element("div")
        .attr("data-type", "code-block")
        .class("code-block")
        .attrs(attrs)
        .child_if(show_bar, || {
            RenderNode::element("div").class("code-block-header").child(
                RenderNode::element("span")
                    .class("code-block-language")
                    .child(RenderNode::text(lang.label())),
            )
        })
        .child(
            RenderNode::element("pre").child(
                RenderNode::element("code")
                    .class(format!("language-{}", lang.as_str()))
                    .child(RenderNode::text(node.plain_text())),
            ),
        )
}
