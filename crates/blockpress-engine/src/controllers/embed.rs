use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::errors::SessionError;
use crate::html::RenderNode;
use crate::models::{BlockId, EmbedType, Node};
use crate::schema::kinds::embed::{detect_embed, embed_type};

use super::NodeOutcome;
use super::settings::{SettingsState, SurfaceEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
}

impl ConsoleLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Receives the console calls made by executing script.
pub trait ConsoleSink {
    fn write(&mut self, level: ConsoleLevel, text: &str);
}

/// Captured console output of one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    lines: Vec<ConsoleLine>,
}

impl ConsoleSink for ExecutionOutput {
    fn write(&mut self, level: ConsoleLevel, text: &str) {
        self.lines.push(ConsoleLine {
            level,
            text: text.to_string(),
        });
    }
}

impl ExecutionOutput {
    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.lines.iter().any(|l| l.level == ConsoleLevel::Error)
    }

    /// The output panel shown under the embed.
    pub fn render(&self) -> RenderNode {
        RenderNode::element("div")
            .class("code-embed-output")
            .children(self.lines.iter().map(|line| {
                RenderNode::element("div")
                    .class(format!("console-line console-{}", line.level.as_str()))
                    .child(RenderNode::text(line.text.clone()))
            }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ScriptError(pub String);

/// Sandbox that runs embed JavaScript.
pub trait ScriptRuntime: Send + Sync {
    fn execute(&self, code: &str, console: &mut dyn ConsoleSink) -> Result<(), ScriptError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmbedCommand {
    SetCode(String),
    /// `None` switches to automatic detection.
    SetType(Option<EmbedType>),
    SetUrl(String),
    SetHeight(f64),
    SetAutoExecute(bool),
    Execute,
    ClearOutput,
    Settings(SurfaceEvent),
}

#[derive(Debug, Clone, Default)]
struct EmbedUi {
    auto_detect: bool,
    output: Option<ExecutionOutput>,
    settings: SettingsState,
}

/// Type detection, settings and script execution for embed blocks.
#[derive(Default)]
pub struct EmbedController {
    runtime: Option<Arc<dyn ScriptRuntime>>,
    ui: HashMap<BlockId, EmbedUi>,
}

impl std::fmt::Debug for EmbedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedController")
            .field("has_runtime", &self.runtime.is_some())
            .field("ui", &self.ui)
            .finish()
    }
}

impl EmbedController {
    pub fn new(runtime: Option<Arc<dyn ScriptRuntime>>) -> Self {
        Self {
            runtime,
            ui: HashMap::new(),
        }
    }

    pub fn output(&self, id: BlockId) -> Option<&ExecutionOutput> {
        self.ui.get(&id).and_then(|ui| ui.output.as_ref())
    }

    pub fn is_auto_detecting(&self, id: BlockId) -> bool {
        self.ui.get(&id).is_some_and(|ui| ui.auto_detect)
    }

    pub fn settings(&self, id: BlockId) -> SettingsState {
        self.ui.get(&id).map(|ui| ui.settings).unwrap_or_default()
    }

    pub fn forget(&mut self, id: BlockId) {
        self.ui.remove(&id);
    }

    pub fn clear(&mut self) {
        self.ui.clear();
    }

    /// Runs the script of an auto-executing JavaScript embed.
    pub fn mount(&mut self, id: BlockId, node: &Node) {
        if node.attrs.flag("autoExecute") && embed_type(node) == EmbedType::Javascript {
            self.execute(id, node);
        }
    }

    /// Executes the embed's JavaScript into its output panel.
    ///
    /// Script failures end up as an error line in the output; they are
    /// never returned to the caller.
    pub fn execute(&mut self, id: BlockId, node: &Node) {
        let mut output = ExecutionOutput::default();
        match &self.runtime {
            None => output.write(ConsoleLevel::Error, "Error: no script runtime available"),
            Some(runtime) => {
                if let Err(e) = runtime.execute(node.attrs.text("code"), &mut output) {
                    log::debug!("{id}: embed script failed: {e}");
                    output.write(ConsoleLevel::Error, &format!("Error: {e}"));
                }
            }
        }
        self.ui.entry(id).or_default().output = Some(output);
    }

    pub fn apply(
        &mut self,
        id: BlockId,
        node: &mut Node,
        command: EmbedCommand,
    ) -> Result<NodeOutcome, SessionError> {
        let before = node.attrs.clone();

        match command {
            EmbedCommand::SetCode(code) => {
                node.attrs.set("code", code);
                if self.is_auto_detecting(id) {
                    detect_into(node);
                }
            }
            EmbedCommand::SetType(None) => {
                self.ui.entry(id).or_default().auto_detect = true;
                detect_into(node);
            }
            EmbedCommand::SetType(Some(kind)) => {
                self.ui.entry(id).or_default().auto_detect = false;
                node.attrs.set("embedType", kind.as_str());
            }
            EmbedCommand::SetUrl(url) => node.attrs.set("url", url.trim()),
            EmbedCommand::SetHeight(height) => {
                if !(height.is_finite() && height > 0.0) {
                    return Err(SessionError::Rejected(format!(
                        "embed height must be positive, got {height}"
                    )));
                }
                node.attrs.set("height", height.round());
            }
            EmbedCommand::SetAutoExecute(auto) => node.attrs.set("autoExecute", auto),
            EmbedCommand::Execute => {
                if embed_type(node) != EmbedType::Javascript {
                    return Err(SessionError::Rejected(format!(
                        "only JavaScript embeds can be executed, this one is {}",
                        embed_type(node).label()
                    )));
                }
                self.execute(id, node);
                return Ok(NodeOutcome::Unchanged);
            }
            EmbedCommand::ClearOutput => {
                if let Some(ui) = self.ui.get_mut(&id) {
                    ui.output = None;
                }
                return Ok(NodeOutcome::Unchanged);
            }
            EmbedCommand::Settings(event) => {
                self.ui.entry(id).or_default().settings.handle(event);
                return Ok(NodeOutcome::Unchanged);
            }
        }

        Ok(if node.attrs == before {
            NodeOutcome::Unchanged
        } else {
            NodeOutcome::Changed
        })
    }
}

fn detect_into(node: &mut Node) {
    let detected = detect_embed(node.attrs.text("code"));
    node.attrs.set("embedType", detected.embed_type.as_str());
    node.attrs.set("url", detected.url.unwrap_or_default());
}
