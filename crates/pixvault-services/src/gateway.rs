//! Upload gateway: bytes in, public URL out.

use std::sync::Arc;
use std::time::Duration;

use pixvault_core::{content_type_for, AppError, StorageConfig};
use pixvault_storage::{Storage, StorageBackend, StorageError};
use uuid::Uuid;

/// Sends image bytes to the media store under a globally unique name.
///
/// The stored name is `{uuid}-{suggested_name}`, so two uploads of the same
/// identity never collide in the store. ASCII punctuation other than `.`, `-`
/// and `_` is replaced by `_` in the stored name, keeping object keys and URL
/// paths identical on every backend. No retries happen here.
#[derive(Clone)]
pub struct UploadGateway {
    storage: Arc<dyn Storage>,
    timeout: Duration,
    max_size_bytes: usize,
}

impl UploadGateway {
    pub fn new(storage: Arc<dyn Storage>, timeout: Duration, max_size_bytes: usize) -> Self {
        Self {
            storage,
            timeout,
            max_size_bytes,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &StorageConfig) -> Self {
        Self::new(
            storage,
            Duration::from_secs(config.upload_timeout_secs),
            config.max_upload_size_bytes,
        )
    }

    pub fn backend_type(&self) -> StorageBackend {
        self.storage.backend_type()
    }

    #[tracing::instrument(skip(self, data), fields(size_bytes = data.len(), backend = %self.storage.backend_type()))]
    pub async fn upload(&self, data: Vec<u8>, suggested_name: &str) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::UploadRejected(format!(
                "{} is empty",
                suggested_name
            )));
        }
        if data.len() > self.max_size_bytes {
            return Err(AppError::UploadRejected(format!(
                "{} is {} bytes, above the {} byte limit",
                suggested_name,
                data.len(),
                self.max_size_bytes
            )));
        }

        let filename = format!("{}-{}", Uuid::new_v4(), object_name(suggested_name));
        let content_type = content_type_for(suggested_name);

        match tokio::time::timeout(
            self.timeout,
            self.storage.upload(&filename, content_type, data),
        )
        .await
        {
            Ok(Ok(stored)) => {
                tracing::debug!(storage_key = %stored.key, url = %stored.url, "Upload stored");
                Ok(stored.url)
            }
            Ok(Err(e)) => Err(map_storage_error(e)),
            Err(_) => Err(AppError::UploadUnavailable(format!(
                "upload of {} timed out after {:?}",
                suggested_name, self.timeout
            ))),
        }
    }
}

fn object_name(suggested_name: &str) -> String {
    suggested_name
        .chars()
        .map(|c| {
            let keep = c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_');
            if (c.is_ascii() && !keep) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

fn map_storage_error(err: StorageError) -> AppError {
    if err.is_rejection() {
        AppError::UploadRejected(err.to_string())
    } else {
        AppError::UploadUnavailable(err.to_string())
    }
}
