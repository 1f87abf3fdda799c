use super::parser::VOID_ELEMENTS;

/// Declarative description of HTML output.
///
/// Node schemas describe their stored markup as a `RenderNode` tree; a
/// single renderer turns it into a string, so no schema ever concatenates
/// HTML by hand.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<RenderNode>,
    },
    Text(String),
}

impl RenderNode {
    pub fn element(tag: impl Into<String>) -> Self {
        RenderNode::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        RenderNode::Text(text.into())
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let RenderNode::Element { attrs, .. } = &mut self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    pub fn attrs(mut self, extra: impl IntoIterator<Item = (String, String)>) -> Self {
        if let RenderNode::Element { attrs, .. } = &mut self {
            attrs.extend(extra);
        }
        self
    }

    /// Adds the attribute only when `value` is `Some`.
    pub fn attr_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, child: RenderNode) -> Self {
        if let RenderNode::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn children(mut self, extra: impl IntoIterator<Item = RenderNode>) -> Self {
        if let RenderNode::Element { children, .. } = &mut self {
            children.extend(extra);
        }
        self
    }

    /// Appends the child only when `cond` holds.
    pub fn child_if(self, cond: bool, child: impl FnOnce() -> RenderNode) -> Self {
        if cond { self.child(child()) } else { self }
    }

    pub fn write_html(&self, out: &mut String) {
        match self {
            RenderNode::Text(text) => out.push_str(&html_escape::encode_text(text)),
            RenderNode::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }
}

/// Renders a sequence of nodes back to back.
pub fn render_html(nodes: &[RenderNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_html(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_nested_elements() {
        let node = RenderNode::element("div")
            .attr("data-type", "alert")
            .child(RenderNode::element("p").child(RenderNode::text("Hi")));
        assert_eq!(node.to_html(), r#"<div data-type="alert"><p>Hi</p></div>"#);
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let node = RenderNode::element("div")
            .attr("data-code", r#"<a href="x">&</a>"#)
            .child(RenderNode::text("1 < 2 & 3"));
        assert_eq!(
            node.to_html(),
            r#"<div data-code="&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;">1 &lt; 2 &amp; 3</div>"#
        );
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let node = RenderNode::element("img").attr("src", "/a.png");
        assert_eq!(node.to_html(), r#"<img src="/a.png">"#);
    }

    #[test]
    fn test_optional_helpers() {
        let node = RenderNode::element("span")
            .attr_opt("title", None::<String>)
            .attr_opt("lang", Some("en"))
            .child_if(false, || RenderNode::text("hidden"))
            .child_if(true, || RenderNode::text("shown"));
        assert_eq!(node.to_html(), r#"<span lang="en">shown</span>"#);
    }

    #[test]
    fn test_render_html_concatenates() {
        let html = render_html(&[RenderNode::element("hr"), RenderNode::text("x")]);
        assert_eq!(html, "<hr>x");
    }
}
