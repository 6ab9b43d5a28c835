//! The media store seam used by the upload gateway.

use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The store refused the object itself; retrying the same upload won't help.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether the request itself was unacceptable, as opposed to the backend
    /// failing to serve it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StorageError::InvalidKey(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Where an uploaded object ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Backend-internal key, `{prefix}/{filename}`.
    pub key: String,
    /// Publicly reachable URL recorded in the catalog.
    pub url: String,
    pub size_bytes: u64,
}

/// A write-only media store.
///
/// Pixvault never reads objects back; the catalog keeps the URL and callers
/// fetch from the store directly.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `filename` (already unique) inside the configured prefix.
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredObject>;

    fn backend_type(&self) -> StorageBackend;
}
