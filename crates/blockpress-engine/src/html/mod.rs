//! # HTML codec
//!
//! A forgiving HTML fragment parser and a declarative renderer.
//!
//! - **`cursor`**: byte cursor used by the tokenizer
//! - **`dom`**: parsed `Element`/`DomNode` tree with query helpers
//! - **`parser`**: `parse_fragment`, never fails, recovers from malformed markup
//! - **`render`**: `RenderNode` descriptions and the single HTML renderer
//!
//! Stored post content is untrusted: the parser accepts anything and the
//! schema layer decides what survives.

pub mod cursor;
pub mod dom;
pub mod parser;
pub mod render;

pub use dom::{DomNode, Element};
pub use parser::parse_fragment;
pub use render::{RenderNode, render_html};
