/// Toolbar actions offered around the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarAction {
    Save,
    Publish,
    Preview,
}

impl ToolbarAction {
    pub const ALL: &'static [ToolbarAction] =
        &[ToolbarAction::Save, ToolbarAction::Publish, ToolbarAction::Preview];

    pub fn label(self) -> &'static str {
        match self {
            ToolbarAction::Save => "Save",
            ToolbarAction::Publish => "Publish",
            ToolbarAction::Preview => "Preview",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionState {
    pub action: ToolbarAction,
    pub enabled: bool,
}

/// Chrome shared between the editor and the page around it: the title
/// shown in the header, the toolbar actions and whether the editor is
/// ready to take input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorContext {
    title: String,
    actions: Vec<ActionState>,
    ready: bool,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new("")
    }
}

impl EditorContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            actions: ToolbarAction::ALL
                .iter()
                .map(|&action| ActionState {
                    action,
                    enabled: true,
                })
                .collect(),
            ready: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub(crate) fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn actions(&self) -> &[ActionState] {
        &self.actions
    }

    /// Actions can only be used once the editor is ready.
    pub fn is_enabled(&self, action: ToolbarAction) -> bool {
        self.ready
            && self
                .actions
                .iter()
                .any(|state| state.action == action && state.enabled)
    }

    pub fn set_enabled(&mut self, action: ToolbarAction, enabled: bool) {
        if let Some(state) = self.actions.iter_mut().find(|s| s.action == action) {
            state.enabled = enabled;
        }
    }
}
