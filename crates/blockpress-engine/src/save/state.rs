use std::fmt;
use std::time::Duration;

use crate::errors::EditorError;

pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_secs(5);
pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveConfig {
    /// Quiet period after the last change before an autosave runs.
    pub autosave_debounce: Duration,
    /// Deadline for a single save call, manual or automatic.
    pub save_timeout: Duration,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            autosave_debounce: DEFAULT_AUTOSAVE_DEBOUNCE,
            save_timeout: DEFAULT_SAVE_TIMEOUT,
        }
    }
}

/// Status shown next to the save button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

/// Digest of serialized content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    pub fn of(content: &str) -> Self {
        Self(blake3::hash(content.as_bytes()))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.0.to_hex()[..12])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.to_hex().as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutosaveState {
    pub status: SaveStatus,
    /// Hash of the content last written successfully.
    pub last_saved_hash: Option<ContentHash>,
    pub has_unsaved_changes: bool,
}

/// Where the coordinator stands, derived from its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Idle,
    PendingAutosave,
    Saving,
    Saved,
    Error,
}

/// Why a due autosave made no call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveSkip {
    Offline,
    ManualSaveInProgress,
    MissingRequiredFields,
    NeverPersisted,
    Unchanged,
}

impl fmt::Display for AutosaveSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AutosaveSkip::Offline => "offline",
            AutosaveSkip::ManualSaveInProgress => "manual save in progress",
            AutosaveSkip::MissingRequiredFields => "title, author or category missing",
            AutosaveSkip::NeverPersisted => "post has never been saved",
            AutosaveSkip::Unchanged => "content unchanged",
        })
    }
}

/// Result of the most recent due autosave.
#[derive(Debug, Clone, PartialEq)]
pub enum AutosaveOutcome {
    Skipped(AutosaveSkip),
    Saved,
    Failed(EditorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_depends_on_content_only() {
        assert_eq!(ContentHash::of("<p>a</p>"), ContentHash::of("<p>a</p>"));
        assert_ne!(ContentHash::of("<p>a</p>"), ContentHash::of("<p>b</p>"));
        assert_eq!(ContentHash::of("").to_string().len(), 64);
    }
}
