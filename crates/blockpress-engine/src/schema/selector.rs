use std::fmt;

use crate::errors::SchemaError;
use crate::html::{Element, cursor::Cursor};

/// A compound selector: optional tag, any number of classes, and attribute
/// presence or equality tests, e.g. `div.alert[data-type]` or
/// `div[data-type="code-embed"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidSelector {
            selector: source.to_string(),
            reason: reason.to_string(),
        };

        let mut cur = Cursor::new(source.trim());
        let tag = cur.take_while(is_ident_char).to_ascii_lowercase();
        let mut selector = Selector {
            tag: (!tag.is_empty()).then_some(tag),
            classes: Vec::new(),
            attrs: Vec::new(),
        };

        while let Some(b) = cur.bump() {
            match b {
                b'.' => {
                    let class = cur.take_while(is_ident_char);
                    if class.is_empty() {
                        return Err(invalid("empty class name"));
                    }
                    selector.classes.push(class.to_string());
                }
                b'[' => {
                    let name = cur.take_while(is_ident_char).to_ascii_lowercase();
                    if name.is_empty() {
                        return Err(invalid("empty attribute name"));
                    }
                    let value = if cur.peek() == Some(b'=') {
                        cur.bump();
                        Some(parse_value(&mut cur).ok_or_else(|| invalid("unterminated value"))?)
                    } else {
                        None
                    };
                    if cur.bump() != Some(b']') {
                        return Err(invalid("expected `]`"));
                    }
                    selector.attrs.push((name, value));
                }
                other => {
                    return Err(invalid(&format!("unexpected character `{}`", other as char)));
                }
            }
        }

        if selector.tag.is_none() && selector.classes.is_empty() && selector.attrs.is_empty() {
            return Err(invalid("empty selector"));
        }
        Ok(selector)
    }

    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag
            && *tag != element.tag
        {
            return false;
        }
        self.classes.iter().all(|class| element.has_class(class))
            && self.attrs.iter().all(|(name, expected)| {
                match (element.attr(name), expected) {
                    (None, _) => false,
                    (Some(_), None) => true,
                    (Some(actual), Some(expected)) => actual == expected,
                }
            })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for (name, value) in &self.attrs {
            match value {
                Some(value) => write!(f, "[{name}=\"{value}\"]")?,
                None => write!(f, "[{name}]")?,
            }
        }
        Ok(())
    }
}

fn parse_value(cur: &mut Cursor<'_>) -> Option<String> {
    match cur.peek()? {
        quote @ (b'"' | b'\'') => {
            cur.bump();
            let delimiter = if quote == b'"' { "\"" } else { "'" };
            let value = cur.take_until(delimiter).to_string();
            cur.bump()?;
            Some(value)
        }
        _ => Some(cur.take_while(is_ident_char).to_string()),
    }
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{DomNode, parse_fragment};
    use rstest::rstest;

    fn first_element(html: &str) -> Element {
        match parse_fragment(html).into_iter().next() {
            Some(DomNode::Element(el)) => el,
            other => panic!("expected an element, got {other:?}"),
        }
    }

    #[rstest]
    #[case("pre", "<pre>x</pre>", true)]
    #[case("pre", "<div>x</div>", false)]
    #[case(r#"div[data-type="code-embed"]"#, r#"<div data-type="code-embed"></div>"#, true)]
    #[case(r#"div[data-type="code-embed"]"#, r#"<div data-type="code-block"></div>"#, false)]
    #[case("div.alert[data-type]", r#"<div class="alert alert-tip" data-type="TIP"></div>"#, true)]
    #[case("div.alert[data-type]", r#"<div class="alert"></div>"#, false)]
    #[case("[data-type]", r#"<section data-type="x"></section>"#, true)]
    #[case("figure[data-type='image']", r#"<figure data-type="image"></figure>"#, true)]
    fn test_selector_matching(#[case] selector: &str, #[case] html: &str, #[case] expected: bool) {
        let selector = Selector::parse(selector).unwrap();
        assert_eq!(selector.matches(&first_element(html)), expected);
    }

    #[rstest]
    #[case("")]
    #[case("div.")]
    #[case("div[data-type")]
    #[case("div[=x]")]
    #[case("div > p")]
    fn test_invalid_selectors_are_rejected(#[case] source: &str) {
        assert!(matches!(
            Selector::parse(source),
            Err(SchemaError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_display_is_canonical() {
        let selector = Selector::parse("DIV.alert[data-type='INFO']").unwrap();
        assert_eq!(selector.to_string(), r#"div.alert[data-type="INFO"]"#);
    }
}
