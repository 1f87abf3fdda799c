/// Formatting applied to a run of inline text.
///
/// Variant order is the canonical nesting order used when rendering: a link
/// wraps bold, which wraps italic, down to inline code innermost.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mark {
    Link { href: String },
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
}

/// Inline content held by container blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// A run of text with its marks in canonical (sorted, deduplicated) order.
    Text { text: String, marks: Vec<Mark> },
    HardBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked(text: impl Into<String>, mut marks: Vec<Mark>) -> Self {
        marks.sort();
        marks.dedup();
        Inline::Text {
            text: text.into(),
            marks,
        }
    }
}

/// Concatenated text of a run list, hard breaks as newlines.
pub fn plain_text(content: &[Inline]) -> String {
    let mut out = String::new();
    for inline in content {
        match inline {
            Inline::Text { text, .. } => out.push_str(text),
            Inline::HardBreak => out.push('\n'),
        }
    }
    out
}

/// Merges adjacent runs carrying identical marks and drops empty runs.
pub fn normalize_runs(content: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(content.len());
    for inline in content {
        match inline {
            Inline::Text { text, .. } if text.is_empty() => {}
            Inline::Text { text, marks } => {
                if let Some(Inline::Text {
                    text: prev,
                    marks: prev_marks,
                }) = out.last_mut()
                    && *prev_marks == marks
                {
                    prev.push_str(&text);
                    continue;
                }
                out.push(Inline::Text { text, marks });
            }
            Inline::HardBreak => out.push(Inline::HardBreak),
        }
    }
    out
}
