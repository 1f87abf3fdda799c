use std::sync::OnceLock;

use regex::Regex;

use crate::html::{Element, RenderNode};
use crate::models::{EmbedType, Node};
use crate::schema::registry::{AttrParse, AttributeSpec, NodeSchema};

pub const DEFAULT_HEIGHT: f64 = 400.0;

static IFRAME_SRC_REGEX: OnceLock<Regex> = OnceLock::new();
static IFRAME_REGEX: OnceLock<Regex> = OnceLock::new();
static SCRIPT_SRC_REGEX: OnceLock<Regex> = OnceLock::new();
static HTML_TAG_REGEX: OnceLock<Regex> = OnceLock::new();

/// Result of inspecting embed code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedEmbed {
    pub embed_type: EmbedType,
    pub url: Option<String>,
}

/// Works out what kind of embed `code` is.
///
/// An `<iframe>` wins, then a `<script>` with a `src`, then any other tag.
/// Anything else is taken to be plain JavaScript. Iframe and widget
/// detection also pull out the source URL.
pub fn detect_embed(code: &str) -> DetectedEmbed {
    let iframe = IFRAME_REGEX.get_or_init(|| {
        Regex::new(r"(?i)<iframe[\s>/]").expect("Invalid iframe regex")
    });
    if iframe.is_match(code) {
        let src = IFRAME_SRC_REGEX.get_or_init(|| {
            Regex::new(r#"(?is)<iframe\b[^>]*?\bsrc\s*=\s*["']([^"']*)["']"#)
                .expect("Invalid iframe src regex")
        });
        return DetectedEmbed {
            embed_type: EmbedType::Iframe,
            url: capture(src, code),
        };
    }

    let script = SCRIPT_SRC_REGEX.get_or_init(|| {
        Regex::new(r#"(?is)<script\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#)
            .expect("Invalid script src regex")
    });
    if let Some(url) = capture(script, code) {
        return DetectedEmbed {
            embed_type: EmbedType::Widget,
            url: Some(url),
        };
    }

    let tag = HTML_TAG_REGEX
        .get_or_init(|| Regex::new(r"<[a-zA-Z][a-zA-Z0-9-]*[\s/>]").expect("Invalid html tag regex"));
    let embed_type = if tag.is_match(code) {
        EmbedType::Html
    } else {
        EmbedType::Javascript
    };
    DetectedEmbed {
        embed_type,
        url: None,
    }
}

fn capture(regex: &Regex, code: &str) -> Option<String> {
    regex
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Embeds are stored as `<div data-type="code-embed" data-code=..>` with a
/// static preview. A missing or `auto` type is detected from the code.
pub fn schema() -> NodeSchema {
    NodeSchema::atomic(view)
        .selector(r#"div[data-type="code-embed"]"#)
        .attribute(AttributeSpec::text("code", "data-code", ""))
        .attribute(AttributeSpec::new(
            "embedType",
            EmbedType::default().as_str(),
            parse_embed_type,
            |value| match value.as_text() {
                Some(kind) => vec![("data-embed-type".to_string(), kind.to_string())],
                None => Vec::new(),
            },
        ))
        .attribute(AttributeSpec::new(
            "url",
            "",
            |el| match el.attr("data-url") {
                Some(url) => AttrParse::Value(url.into()),
                None => match detect_embed(el.attr("data-code").unwrap_or_default()).url {
                    Some(url) => AttrParse::Value(url.into()),
                    None => AttrParse::Missing,
                },
            },
            |value| match value.as_text() {
                Some(url) => vec![("data-url".to_string(), url.to_string())],
                None => Vec::new(),
            },
        ))
        .attribute(AttributeSpec::number("height", "data-height", Some(DEFAULT_HEIGHT)))
        .attribute(AttributeSpec::flag("autoExecute", "data-auto-execute", false))
}

fn parse_embed_type(el: &Element) -> AttrParse {
    let code = el.attr("data-code").unwrap_or_default();
    match el.attr("data-embed-type").map(str::trim) {
        None | Some("") => AttrParse::Value(detect_embed(code).embed_type.as_str().into()),
        Some(raw) if raw.eq_ignore_ascii_case("auto") => {
            AttrParse::Value(detect_embed(code).embed_type.as_str().into())
        }
        Some(raw) => match EmbedType::parse(raw) {
            Some(kind) => AttrParse::Value(kind.as_str().into()),
            None => AttrParse::Recovered {
                value: detect_embed(code).embed_type.as_str().into(),
                reason: format!("unknown embed type `{raw}`, detected from code"),
            },
        },
    }
}

pub fn embed_type(node: &Node) -> EmbedType {
    EmbedType::parse(node.attrs.text("embedType")).unwrap_or_default()
}

pub fn height(node: &Node) -> f64 {
    node.attrs.number("height").unwrap_or(DEFAULT_HEIGHT)
}

fn view(node: &Node, attrs: Vec<(String, String)>) -> RenderNode {
    let kind = embed_type(node);
    let url = node.attrs.text("url");

    let preview = if kind == EmbedType::Iframe && !url.is_empty() {
        RenderNode::element("iframe")
            .attr("src", url)
            .attr("height", height(node).to_string())
            .attr("width", "100%")
            .attr("frameborder", "0")
            .attr("allowfullscreen", "")
    } else {
        RenderNode::element("pre")
            .class("code-embed-source")
            .child(RenderNode::element("code").child(RenderNode::text(node.attrs.text("code"))))
    };

    RenderNode::element("div")
        .attr("data-type", "code-embed")
        .class(format!("code-embed code-embed-{}", kind.as_str()))
        .attrs(attrs)
        .child(
            RenderNode::element("div").class("code-embed-header").child(
                RenderNode::element("span")
                    .class("code-embed-label")
                    .child(RenderNode::text(kind.label())),
            ),
        )
        .child(
            RenderNode::element("div")
                .class("code-embed-preview")
                .child(preview),
        )
}
