//! Error types for the editor

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

use crate::models::{BlockId, NodeType};
use crate::session::SessionState;

/// Per-field validation messages, keyed by the record's field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("node type `{0}` is already registered")]
    DuplicateType(NodeType),

    #[error("node type `{0}` is not registered")]
    Unregistered(NodeType),

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Malformed stored attribute data.
///
/// Always recovered where it is found: the attribute falls back to its
/// default and parsing carries on with the next attribute or node.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location}: {reason}")]
pub struct SerializationError {
    /// `type.attribute` or `block N <tag>`.
    pub location: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("editor is not ready (state: {0:?})")]
    NotReady(SessionState),

    #[error("editor session has been destroyed")]
    Destroyed,

    #[error("editor session is already mounted")]
    AlreadyMounted,

    #[error("no block with id {0}")]
    UnknownBlock(BlockId),

    #[error("{expected} command applied to a {found} block")]
    WrongNodeType { expected: NodeType, found: NodeType },

    #[error("{0} blocks have no inline content")]
    NotAContainer(NodeType),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error("unsupported file type `{mime_type}`")]
    UnsupportedType { mime_type: String },

    #[error("file is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("upload failed: {0}")]
    Network(String),
}

/// Failure of the transport underneath a collaborator call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Errors surfaced by editor operations that the user may need to act on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("validation failed for {}", field_list(.0))]
    Validation(FieldErrors),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("network error: {0}")]
    Network(String),

    #[error("operation timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("record no longer exists: {message}")]
    ConcurrencyConflict { message: String },

    #[error("a save is already in progress")]
    SaveInProgress,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl EditorError {
    /// Classifies an unsuccessful collaborator response.
    ///
    /// Field errors mean validation; a message saying the record is gone
    /// means another user deleted it; anything else is reported like a
    /// transport failure.
    pub fn from_failure(message: String, errors: Option<FieldErrors>) -> Self {
        if let Some(errors) = errors.filter(|e| !e.is_empty()) {
            return EditorError::Validation(errors);
        }
        let lower = message.to_ascii_lowercase();
        if ["not found", "no longer exists", "does not exist"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            EditorError::ConcurrencyConflict { message }
        } else {
            EditorError::Network(message)
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, EditorError::Network(_) | EditorError::Timeout { .. })
    }

    /// Message suitable for a notification toast.
    pub fn user_message(&self) -> String {
        match self {
            EditorError::Validation(errors) => {
                format!("Please fix the highlighted fields: {}.", field_list(errors))
            }
            EditorError::Serialization(_) => {
                "Some content could not be read and was restored to its defaults.".to_string()
            }
            EditorError::Network(message) => {
                format!("Could not save your changes: {message}. Your edits are still here.")
            }
            EditorError::Timeout { .. } => {
                "Save operation timed out. Please check your connection and try again.".to_string()
            }
            EditorError::ConcurrencyConflict { .. } => {
                "This post may have been deleted by another user. Copy your changes and reload the page."
                    .to_string()
            }
            EditorError::SaveInProgress => "A save is already in progress.".to_string(),
            EditorError::Session(e) => e.to_string(),
            EditorError::Upload(e) => e.to_string(),
        }
    }
}

fn field_list(errors: &FieldErrors) -> String {
    errors.keys().cloned().collect::<Vec<_>>().join(", ")
}
