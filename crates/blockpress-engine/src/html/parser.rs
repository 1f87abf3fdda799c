use super::{
    cursor::Cursor,
    dom::{DomNode, Element},
};

/// Elements that never have content or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text up to the matching closing tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

/// Opening one of these while a `<p>` is open implicitly closes the `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

/// Parses an HTML fragment into a forest of [`DomNode`]s.
///
/// The parser never fails. Stray closing tags are ignored, unclosed elements
/// are closed at end of input, and a closing tag closes every element opened
/// after its matching opener. Comments, doctypes and processing instructions
/// are dropped. A `<` that does not start a tag is kept as text.
pub fn parse_fragment(html: &str) -> Vec<DomNode> {
    let mut cur = Cursor::new(html);
    let mut tree = TreeBuilder::default();
    let mut text_start = cur.pos();

    while !cur.eof() {
        if cur.peek() != Some(b'<') {
            cur.take_until("<");
            continue;
        }

        let tag_start = cur.pos();
        if cur.starts_with(b"<!--") {
            tree.text(&html[text_start..tag_start]);
            cur.bump_n(4);
            cur.take_until("-->");
            cur.bump_n(3);
        } else if cur.starts_with(b"<!") || cur.starts_with(b"<?") {
            tree.text(&html[text_start..tag_start]);
            cur.take_until(">");
            cur.bump();
        } else if cur.starts_with(b"</") && is_tag_name_start(cur.peek_at(2)) {
            tree.text(&html[text_start..tag_start]);
            cur.bump_n(2);
            let name = cur.take_while(is_tag_name_char).to_ascii_lowercase();
            cur.take_until(">");
            cur.bump();
            tree.close(&name);
        } else if is_tag_name_start(cur.peek_at(1)) {
            tree.text(&html[text_start..tag_start]);
            cur.bump();
            let tag = parse_start_tag(&mut cur);
            if RAW_TEXT_ELEMENTS.contains(&tag.element.tag.as_str()) && !tag.self_closing {
                let closing = format!("</{}", tag.element.tag);
                let raw = cur.take_until_ignore_case(&closing);
                let mut element = tag.element;
                if !raw.is_empty() {
                    element.children.push(DomNode::Text(raw.to_string()));
                }
                cur.take_until(">");
                cur.bump();
                tree.append(element);
            } else if tag.self_closing || VOID_ELEMENTS.contains(&tag.element.tag.as_str()) {
                tree.append(tag.element);
            } else {
                tree.open(tag.element);
            }
        } else {
            // A literal '<' inside text.
            cur.bump();
            continue;
        }
        text_start = cur.pos();
    }

    tree.text(&html[text_start..]);
    tree.finish()
}

struct StartTag {
    element: Element,
    self_closing: bool,
}

/// Parses `name attr=value ...>` with the cursor just past `<`.
fn parse_start_tag(cur: &mut Cursor<'_>) -> StartTag {
    let mut element = Element::new(cur.take_while(is_tag_name_char).to_ascii_lowercase());
    let mut self_closing = false;

    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None => break,
            Some(b'>') => {
                cur.bump();
                break;
            }
            Some(b'/') => {
                cur.bump();
                if cur.peek() == Some(b'>') {
                    cur.bump();
                    self_closing = true;
                    break;
                }
            }
            Some(_) => {
                let name = cur
                    .take_while(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/'))
                    .to_ascii_lowercase();
                if name.is_empty() {
                    // Garbage such as a lone quote; skip it.
                    cur.bump();
                    continue;
                }
                cur.skip_whitespace();
                let value = if cur.peek() == Some(b'=') {
                    cur.bump();
                    cur.skip_whitespace();
                    parse_attr_value(cur)
                } else {
                    String::new()
                };
                if !element.has_attr(&name) {
                    element.attrs.push((name, value));
                }
            }
        }
    }

    StartTag {
        element,
        self_closing,
    }
}

fn parse_attr_value(cur: &mut Cursor<'_>) -> String {
    let raw = match cur.peek() {
        Some(quote @ (b'"' | b'\'')) => {
            cur.bump();
            let delimiter = if quote == b'"' { "\"" } else { "'" };
            let raw = cur.take_until(delimiter);
            cur.bump();
            raw
        }
        _ => cur.take_while(|b| !b.is_ascii_whitespace() && b != b'>'),
    };
    html_escape::decode_html_entities(raw).into_owned()
}

fn is_tag_name_start(b: Option<u8>) -> bool {
    matches!(b, Some(b) if b.is_ascii_alphabetic())
}

fn is_tag_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':'
}

/// Stack-based tree construction.
#[derive(Default)]
struct TreeBuilder {
    roots: Vec<DomNode>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let decoded = html_escape::decode_html_entities(raw).into_owned();
        let siblings = self.siblings();
        if let Some(DomNode::Text(prev)) = siblings.last_mut() {
            prev.push_str(&decoded);
        } else {
            siblings.push(DomNode::Text(decoded));
        }
    }

    fn open(&mut self, element: Element) {
        if CLOSES_PARAGRAPH.contains(&element.tag.as_str())
            && self.open.last().is_some_and(|top| top.tag == "p")
        {
            self.pop();
        }
        self.open.push(element);
    }

    fn append(&mut self, element: Element) {
        if CLOSES_PARAGRAPH.contains(&element.tag.as_str())
            && self.open.last().is_some_and(|top| top.tag == "p")
        {
            self.pop();
        }
        self.siblings().push(DomNode::Element(element));
    }

    fn close(&mut self, tag: &str) {
        let Some(depth) = self.open.iter().rposition(|el| el.tag == tag) else {
            log::debug!("ignoring stray closing tag </{tag}>");
            return;
        };
        while self.open.len() > depth {
            self.pop();
        }
    }

    fn pop(&mut self) {
        if let Some(element) = self.open.pop() {
            self.siblings().push(DomNode::Element(element));
        }
    }

    fn siblings(&mut self) -> &mut Vec<DomNode> {
        match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        }
    }

    fn finish(mut self) -> Vec<DomNode> {
        while !self.open.is_empty() {
            self.pop();
        }
        self.roots
    }
}
