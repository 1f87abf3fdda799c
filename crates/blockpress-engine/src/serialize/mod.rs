//! # Serialization
//!
//! Stored HTML fragment to [`Document`] and back, driven entirely by the
//! [`SchemaRegistry`]. Loading never fails: every problem is repaired in
//! place and recorded in a [`ParseReport`].

use crate::errors::{SchemaError, SerializationError};
use crate::html::{DomNode, Element, parse_fragment};
use crate::models::{Document, Node, NodeType};
use crate::schema::{Containment, SchemaRegistry, inline::parse_inline};

/// Local recoveries made while loading a document.
///
/// For logging only; nothing here is shown to the author.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    recoveries: Vec<SerializationError>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.recoveries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recoveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recoveries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SerializationError> {
        self.recoveries.iter()
    }

    fn record(&mut self, location: impl Into<String>, reason: impl Into<String>) {
        let error = SerializationError {
            location: location.into(),
            reason: reason.into(),
        };
        log::debug!("recovered while loading content: {error}");
        self.recoveries.push(error);
    }
}

/// Parses a stored HTML fragment.
///
/// Top-level elements are matched against the registry in registration
/// order. Unknown wrappers that contain recognizable blocks are unwrapped;
/// other loose text and inline markup is gathered into paragraphs.
pub fn parse_document(registry: &SchemaRegistry, html: &str) -> (Document, ParseReport) {
    let mut builder = DocumentBuilder {
        registry,
        nodes: Vec::new(),
        loose: Vec::new(),
        report: ParseReport::default(),
    };
    builder.visit_all(parse_fragment(html));
    builder.flush_loose();

    let DocumentBuilder { nodes, report, .. } = builder;
    if !report.is_clean() {
        log::info!(
            "loaded {} blocks with {} recoveries",
            nodes.len(),
            report.len()
        );
    }
    (Document::from_nodes(nodes), report)
}

/// Renders a document to its stored HTML fragment, one block per line.
pub fn render_document(registry: &SchemaRegistry, doc: &Document) -> Result<String, SchemaError> {
    let mut out = String::new();
    for (i, node) in doc.nodes().iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        registry.schema(node.kind)?.render(node).write_html(&mut out);
    }
    Ok(out)
}

struct DocumentBuilder<'r> {
    registry: &'r SchemaRegistry,
    nodes: Vec<Node>,
    loose: Vec<DomNode>,
    report: ParseReport,
}

impl DocumentBuilder<'_> {
    fn visit_all(&mut self, nodes: Vec<DomNode>) {
        for node in nodes {
            match node {
                DomNode::Text(text) => self.loose.push(DomNode::Text(text)),
                DomNode::Element(el) => self.visit_element(el),
            }
        }
    }

    fn visit_element(&mut self, el: Element) {
        if let Some((kind, schema)) = self.registry.match_element(&el) {
            self.flush_loose();
            let (attrs, problems) = schema.parse_attrs(&el);
            for (attr, reason) in problems {
                self.report.record(format!("{kind}.{attr}"), reason);
            }
            let content = match schema.containment() {
                Containment::BlockContainer => schema.parse_content(&el),
                Containment::BlockAtomic => Vec::new(),
            };
            let node = Node {
                kind,
                attrs,
                content,
            };
            if schema.is_discarded(&node) {
                self.report
                    .record(format!("<{}>", el.tag), format!("dropped empty {kind} block"));
            } else {
                self.nodes.push(node);
            }
        } else if self.contains_block(&el) {
            self.flush_loose();
            self.report
                .record(format!("<{}>", el.tag), "unknown wrapper element unwrapped");
            self.visit_all(el.children);
        } else {
            self.loose.push(DomNode::Element(el));
        }
    }

    fn contains_block(&self, el: &Element) -> bool {
        el.child_elements()
            .any(|child| self.registry.match_element(child).is_some() || self.contains_block(child))
    }

    /// Turns gathered loose content into a paragraph, ignoring whitespace.
    fn flush_loose(&mut self) {
        if self.loose.is_empty() {
            return;
        }
        let mut wrapper = Element::new("p");
        wrapper.children = std::mem::take(&mut self.loose);
        if wrapper.text_content().trim().is_empty() {
            return;
        }
        self.report
            .record("top level", "loose content wrapped in a paragraph");
        let mut node = self
            .registry
            .instantiate(NodeType::Paragraph)
            .unwrap_or_else(|_| Node::new(NodeType::Paragraph));
        node.content = parse_inline(&wrapper);
        self.nodes.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Inline, Mark};
    use pretty_assertions::assert_eq;

    fn load(html: &str) -> (Document, ParseReport) {
        parse_document(&SchemaRegistry::standard(), html)
    }

    fn kinds(doc: &Document) -> Vec<NodeType> {
        doc.nodes().iter().map(|n| n.kind).collect()
    }

    #[test]
    fn test_whitespace_between_blocks_is_ignored() {
        let (doc, report) = load("<p>a</p>\n  \n<h2>b</h2>\n");
        assert_eq!(kinds(&doc), vec![NodeType::Paragraph, NodeType::Heading]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_loose_text_and_inline_markup_become_one_paragraph() {
        let (doc, report) = load("Hello <b>world</b><p>next</p>");
        assert_eq!(kinds(&doc), vec![NodeType::Paragraph, NodeType::Paragraph]);
        assert_eq!(
            doc.nodes()[0].content,
            vec![Inline::text("Hello "), Inline::marked("world", vec![Mark::Bold])]
        );
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_unknown_wrapper_with_blocks_is_unwrapped() {
        let (doc, report) = load("<section><h3>Title</h3><p>Body</p></section>");
        assert_eq!(kinds(&doc), vec![NodeType::Heading, NodeType::Paragraph]);
        assert_eq!(doc.nodes()[0].attrs.number("level"), Some(3.0));
        assert_eq!(report.iter().next().map(|e| e.location.as_str()), Some("<section>"));
    }

    #[test]
    fn test_malformed_gallery_json_does_not_abort_the_document() {
        // Given a gallery with broken JSON and no grid to salvage from, between two paragraphs
        let html = r#"<p>before</p><div data-type="image-gallery" data-images="[{oops"></div><p>after</p>"#;

        // When loaded
        let (doc, report) = load(html);

        // Then the gallery is dropped and both paragraphs survive
        assert_eq!(kinds(&doc), vec![NodeType::Paragraph, NodeType::Paragraph]);
        let locations: Vec<_> = report.iter().map(|e| e.location.clone()).collect();
        assert_eq!(locations, vec!["imageGallery.images", "<div>"]);
    }

    #[test]
    fn test_malformed_gallery_json_is_rebuilt_from_grid() {
        let html = r#"<div data-type="image-gallery" data-images="not json" data-columns="2">
            <div class="gallery-grid">
              <figure class="gallery-item"><img src="/a.jpg" alt="A" data-image-id="a"><figcaption>First</figcaption></figure>
              <figure class="gallery-item"><img src="/b.jpg" alt="B" data-image-id="b"></figure>
            </div></div>"#;

        let (doc, report) = load(html);

        let gallery = &doc.nodes()[0];
        let images = gallery.attrs.images("images");
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, "a");
        assert_eq!(images[0].caption, "First");
        assert_eq!(images[1].src, "/b.jpg");
        assert_eq!(gallery.attrs.number("columns"), Some(2.0));
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_specific_embed_selector_wins_over_generic_pre() {
        let html = r#"<div data-type="code-embed" data-code="&lt;iframe src=&quot;https://v.test/1&quot;&gt;&lt;/iframe&gt;"><pre><code>x</code></pre></div>"#;
        let (doc, _) = load(html);
        let embed = &doc.nodes()[0];
        assert_eq!(embed.kind, NodeType::Embed);
        assert_eq!(embed.attrs.text("embedType"), "iframe");
        assert_eq!(embed.attrs.text("url"), "https://v.test/1");
    }

    #[test]
    fn test_bare_pre_is_a_code_block() {
        let (doc, _) = load(r#"<pre><code class="language-rs">fn main() {}</code></pre>"#);
        let block = &doc.nodes()[0];
        assert_eq!(block.kind, NodeType::CodeBlock);
        assert_eq!(block.attrs.text("language"), "rust");
        assert!(block.attrs.flag("showLanguageBar"));
        assert_eq!(block.plain_text(), "fn main() {}");
    }

    #[test]
    fn test_out_of_range_values_fall_back_to_defaults() {
        let html = r#"<div data-type="image-gallery" data-images='[{"id":"1","src":"/a.png"}]' data-columns="12" data-gap="huge"></div>"#;
        let (doc, report) = load(html);
        let gallery = &doc.nodes()[0];
        assert_eq!(gallery.attrs.number("columns"), Some(3.0));
        assert_eq!(gallery.attrs.text("gap"), "md");
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_image_without_source_is_dropped() {
        let (doc, report) = load(r#"<figure data-type="image"><img alt="nothing"></figure>"#);
        assert!(doc.is_empty());
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_render_separates_blocks_with_newlines() {
        let registry = SchemaRegistry::standard();
        let doc = Document::from_nodes(vec![
            Node::new(NodeType::Paragraph).with_text("a"),
            Node::new(NodeType::Paragraph).with_text("b"),
        ]);
        assert_eq!(render_document(&registry, &doc).unwrap(), "<p>a</p>\n<p>b</p>");
    }

    #[test]
    fn test_render_unregistered_type_is_an_error() {
        let registry = SchemaRegistry::new();
        let doc = Document::from_nodes(vec![Node::new(NodeType::Promo)]);
        assert_eq!(
            render_document(&registry, &doc),
            Err(SchemaError::Unregistered(NodeType::Promo))
        );
    }
}
