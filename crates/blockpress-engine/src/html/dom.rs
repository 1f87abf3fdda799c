/// A parsed HTML node.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(Element),
    /// Text with entities already decoded.
    Text(String),
}

/// A parsed HTML element. Tag and attribute names are lowercase.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<DomNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            DomNode::Element(el) => Some(el),
            DomNode::Text(_) => None,
        })
    }

    /// First descendant (depth-first, excluding `self`) with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find(tag) {
                return Some(found);
            }
        }
        None
    }

    /// `self` when it has the tag, otherwise its first matching descendant.
    pub fn locate(&self, tag: &str) -> Option<&Element> {
        if self.tag == tag {
            Some(self)
        } else {
            self.find(tag)
        }
    }

    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.tag == tag {
                out.push(child);
            }
            child.find_all(tag, out);
        }
    }

    /// Concatenated descendant text; `<br>` contributes a newline.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                DomNode::Text(text) => out.push_str(text),
                DomNode::Element(el) if el.tag == "br" => out.push('\n'),
                DomNode::Element(el) => el.collect_text(out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        let mut img = Element::new("img");
        img.attrs.push(("src".into(), "/a.png".into()));
        let mut figure = Element::new("figure");
        figure.attrs.push(("class".into(), "image-node  wide".into()));
        figure.children.push(DomNode::Element(img));
        let mut caption = Element::new("figcaption");
        caption.children.push(DomNode::Text("Hi".into()));
        caption.children.push(DomNode::Element(Element::new("br")));
        caption.children.push(DomNode::Text("there".into()));
        figure.children.push(DomNode::Element(caption));
        figure
    }

    #[test]
    fn test_class_matching_splits_whitespace() {
        let el = sample();
        assert!(el.has_class("wide"));
        assert!(el.has_class("image-node"));
        assert!(!el.has_class("image"));
    }

    #[test]
    fn test_find_and_locate() {
        let el = sample();
        assert_eq!(el.find("img").and_then(|i| i.attr("src")), Some("/a.png"));
        assert_eq!(el.locate("figure").map(|f| f.tag.as_str()), Some("figure"));
        assert!(el.find("figure").is_none());
    }

    #[test]
    fn test_text_content_maps_br_to_newline() {
        assert_eq!(sample().text_content(), "Hi\nthere");
    }
}
