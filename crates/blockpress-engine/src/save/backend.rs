use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{EditorError, FieldErrors, TransportError};

use super::record::PostRecord;

/// Reply of the save collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    /// Id of the stored record, reported when it was created by this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SaveResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn into_result(self) -> Result<Self, EditorError> {
        if self.success {
            Ok(self)
        } else {
            Err(EditorError::from_failure(self.message, self.errors))
        }
    }
}

/// Reply of the delete and restore collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl MutationResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub fn into_result(self) -> Result<Self, EditorError> {
        if self.success {
            Ok(self)
        } else {
            Err(EditorError::from_failure(self.message, None))
        }
    }
}

/// Persistence for posts.
///
/// A `TransportError` means the call never produced a reply; an unsuccessful
/// reply is still `Ok`.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn save(&self, record: &PostRecord) -> Result<SaveResponse, TransportError>;

    async fn delete(&self, id: &str) -> Result<MutationResponse, TransportError>;

    async fn restore(&self, id: &str) -> Result<MutationResponse, TransportError>;
}
