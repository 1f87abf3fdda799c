//! # Schema registry
//!
//! Per node type: the selectors that recognize it in stored HTML, its
//! attribute specs (default, parse rule, render rule), its containment and
//! its render description.
//!
//! - **`registry`**: `SchemaRegistry`, `NodeSchema`, `AttributeSpec`
//! - **`selector`**: tag/class/attribute matchers
//! - **`inline`**: inline content of container blocks
//! - **`kinds`**: the built-in node types

pub mod inline;
pub mod kinds;
pub mod registry;
pub mod selector;

pub use registry::{AttrParse, AttributeSpec, Containment, NodeSchema, SchemaRegistry};
pub use selector::Selector;
