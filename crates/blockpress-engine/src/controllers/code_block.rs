use std::collections::HashMap;

use crate::models::{BlockId, CodeLanguage, Node};
use crate::schema::kinds::code_block;

use super::NodeOutcome;
use super::settings::{SettingsState, SurfaceEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeBlockCommand {
    SetLanguage(CodeLanguage),
    SetLanguageBar(bool),
    ToggleLanguageBar,
    Settings(SurfaceEvent),
}

/// Language selection and language bar visibility. The code text itself
/// is edited as inline content and never touched here.
#[derive(Debug, Default)]
pub struct CodeBlockController {
    settings: HashMap<BlockId, SettingsState>,
}

impl CodeBlockController {
    /// Label shown in the language bar.
    pub fn label(node: &Node) -> &'static str {
        code_block::language(node).label()
    }

    pub fn settings(&self, id: BlockId) -> SettingsState {
        self.settings.get(&id).copied().unwrap_or_default()
    }

    pub fn forget(&mut self, id: BlockId) {
        self.settings.remove(&id);
    }

    pub fn clear(&mut self) {
        self.settings.clear();
    }

    pub fn apply(&mut self, id: BlockId, node: &mut Node, command: CodeBlockCommand) -> NodeOutcome {
        let before = node.attrs.clone();
        match command {
            CodeBlockCommand::SetLanguage(lang) => node.attrs.set("language", lang.as_str()),
            CodeBlockCommand::SetLanguageBar(show) => node.attrs.set("showLanguageBar", show),
            CodeBlockCommand::ToggleLanguageBar => {
                let show = node.attrs.flag("showLanguageBar");
                node.attrs.set("showLanguageBar", !show);
            }
            CodeBlockCommand::Settings(event) => {
                self.settings.entry(id).or_default().handle(event);
            }
        }
        if node.attrs == before {
            NodeOutcome::Unchanged
        } else {
            NodeOutcome::Changed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, NodeType};
    use crate::schema::SchemaRegistry;

    fn block() -> (BlockId, Node) {
        let mut node = SchemaRegistry::standard()
            .instantiate(NodeType::CodeBlock)
            .unwrap();
        node.content = vec![crate::models::Inline::text("let x = 1;")];
        let doc = Document::from_nodes(vec![node.clone()]);
        (doc.ids()[0], node)
    }

    #[test]
    fn test_language_switch_leaves_code_untouched() {
        let mut controller = CodeBlockController::default();
        let (id, mut node) = block();
        assert_eq!(CodeBlockController::label(&node), "Plain Text");

        let outcome = controller.apply(id, &mut node, CodeBlockCommand::SetLanguage(CodeLanguage::Rust));

        assert_eq!(outcome, NodeOutcome::Changed);
        assert_eq!(node.attrs.text("language"), "rust");
        assert_eq!(CodeBlockController::label(&node), "Rust");
        assert_eq!(node.plain_text(), "let x = 1;");
    }

    #[test]
    fn test_toggle_language_bar() {
        let mut controller = CodeBlockController::default();
        let (id, mut node) = block();
        assert!(node.attrs.flag("showLanguageBar"));

        controller.apply(id, &mut node, CodeBlockCommand::ToggleLanguageBar);
        assert!(!node.attrs.flag("showLanguageBar"));

        let outcome = controller.apply(id, &mut node, CodeBlockCommand::SetLanguageBar(false));
        assert_eq!(outcome, NodeOutcome::Unchanged);
    }
}
