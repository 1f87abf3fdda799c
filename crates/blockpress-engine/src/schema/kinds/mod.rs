//! Built-in node schemas, one module per node type.

pub mod alert;
pub mod code_block;
pub mod embed;
pub mod gallery;
pub mod heading;
pub mod image;
pub mod paragraph;
pub mod promo;

use super::registry::NodeSchema;
use crate::models::NodeType;

/// Built-in schemas in registration order.
///
/// Specific wrappers come before generic tags so that, for example, a
/// `div[data-type="code-embed"]` is never taken for a code block and a
/// `figure` image wins over its inner `img`.
pub fn standard_schemas() -> Vec<(NodeType, NodeSchema)> {
    vec![
        (NodeType::Gallery, gallery::schema()),
        (NodeType::Image, image::schema()),
        (NodeType::Embed, embed::schema()),
        (NodeType::Promo, promo::schema()),
        (NodeType::Alert, alert::schema()),
        (NodeType::CodeBlock, code_block::schema()),
        (NodeType::Heading, heading::schema()),
        (NodeType::Paragraph, paragraph::schema()),
    ]
}
