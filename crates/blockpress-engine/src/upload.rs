//! Image upload contract and the checks made before anything is sent.

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::errors::{TransportError, UploadError};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Which files may be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, file: &UploadFile) -> Result<(), UploadError> {
        let allowed = self
            .allowed_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(file.mime_type.trim()));
        if !allowed {
            return Err(UploadError::UnsupportedType {
                mime_type: file.mime_type.clone(),
            });
        }
        if file.size() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: file.size(),
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// A file picked by the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Body returned by the upload endpoint: `{"url": ..}` or `{"error": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Url { url: String },
    Error { error: String },
}

/// Multipart upload endpoint.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, TransportError>;
}

/// Checks `file` against `policy` and uploads it, returning its URL.
pub async fn upload_one(
    uploader: &dyn Uploader,
    policy: &UploadPolicy,
    file: &UploadFile,
) -> Result<String, UploadError> {
    policy.check(file)?;
    match uploader.upload(file).await {
        Ok(UploadResponse::Url { url }) => {
            log::info!("uploaded {} ({} bytes)", file.name, file.size());
            Ok(url)
        }
        Ok(UploadResponse::Error { error }) => {
            log::warn!("upload of {} rejected: {error}", file.name);
            Err(UploadError::Rejected(error))
        }
        Err(e) => {
            log::warn!("upload of {} failed: {e}", file.name);
            Err(UploadError::Network(e.0))
        }
    }
}

/// Uploads every file concurrently. Results come back in input order,
/// whatever order the uploads finish in.
pub async fn upload_all(
    uploader: &dyn Uploader,
    policy: &UploadPolicy,
    files: &[UploadFile],
) -> Vec<Result<String, UploadError>> {
    join_all(files.iter().map(|file| upload_one(uploader, policy, file))).await
}
