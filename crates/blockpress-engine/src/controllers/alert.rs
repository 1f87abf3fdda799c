use crate::models::{AlertKind, Node};
use crate::schema::kinds::alert;

use super::NodeOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertCommand {
    SetKind(AlertKind),
    /// Switches to the next kind, wrapping around.
    CycleKind,
    SetTitle(String),
    SetContent(String),
}

pub fn apply(node: &mut Node, command: AlertCommand) -> NodeOutcome {
    let before = node.attrs.clone();
    match command {
        AlertCommand::SetKind(kind) => node.attrs.set("type", kind.as_str()),
        AlertCommand::CycleKind => {
            let next = alert::kind(node).next();
            node.attrs.set("type", next.as_str());
        }
        AlertCommand::SetTitle(title) => node.attrs.set("title", title),
        AlertCommand::SetContent(content) => node.attrs.set("content", content),
    }
    if node.attrs == before {
        NodeOutcome::Unchanged
    } else {
        NodeOutcome::Changed
    }
}
