use crate::models::Node;
use crate::schema::kinds::promo::DEFAULT_BUTTON_TEXT;

use super::NodeOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoCommand {
    SetTitle(String),
    SetDescription(String),
    SetLocation(Option<String>),
    SetDate(Option<String>),
    /// An empty label restores the default.
    SetButtonText(String),
    SetLogoText(String),
}

pub fn apply(node: &mut Node, command: PromoCommand) -> NodeOutcome {
    let before = node.attrs.clone();
    let attrs = &mut node.attrs;
    match command {
        PromoCommand::SetTitle(title) => attrs.set("title", title),
        PromoCommand::SetDescription(text) => attrs.set("description", text),
        PromoCommand::SetLocation(location) => attrs.set("location", non_empty(location)),
        PromoCommand::SetDate(date) => attrs.set("date", non_empty(date)),
        PromoCommand::SetButtonText(text) => {
            let text = text.trim();
            attrs.set(
                "buttonText",
                if text.is_empty() { DEFAULT_BUTTON_TEXT } else { text },
            );
        }
        PromoCommand::SetLogoText(text) => attrs.set("logoText", text),
    }
    if node.attrs == before {
        NodeOutcome::Unchanged
    } else {
        NodeOutcome::Changed
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttrValue, NodeType};
    use crate::schema::SchemaRegistry;

    #[test]
    fn test_optional_fields_clear_to_null() {
        let mut node = SchemaRegistry::standard().instantiate(NodeType::Promo).unwrap();
        apply(&mut node, PromoCommand::SetLocation(Some("Berlin".into())));
        assert_eq!(node.attrs.opt_text("location"), Some("Berlin"));

        apply(&mut node, PromoCommand::SetLocation(Some("   ".into())));
        assert_eq!(node.attrs.get("location"), Some(&AttrValue::Null));
    }

    #[test]
    fn test_empty_button_text_restores_default() {
        let mut node = SchemaRegistry::standard().instantiate(NodeType::Promo).unwrap();
        apply(&mut node, PromoCommand::SetButtonText("Register".into()));
        assert_eq!(node.attrs.text("buttonText"), "Register");
        apply(&mut node, PromoCommand::SetButtonText(String::new()));
        assert_eq!(node.attrs.text("buttonText"), DEFAULT_BUTTON_TEXT);
    }
}
