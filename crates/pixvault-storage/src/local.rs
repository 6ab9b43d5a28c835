//! Filesystem media store, for development and single-host deployments.
//!
//! Objects are written to `{root}/{prefix}/{filename}` through a `.part`
//! file and renamed into place, so a URL handed to the catalog never points
//! at a half-written image.

use crate::keys::{generate_storage_key, url_path_for_key, validate_storage_key};
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base: String,
    key_prefix: String,
}

impl LocalStorage {
    /// `root` is created if missing. `public_base` is the URL the root is
    /// served under, e.g. `http://localhost:3000/media`.
    pub async fn new(
        root: impl Into<PathBuf>,
        public_base: String,
        key_prefix: String,
    ) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!("cannot create {}: {}", root.display(), e))
        })?;
        let root = fs::canonicalize(&root).await.map_err(|e| {
            StorageError::ConfigError(format!("cannot resolve {}: {}", root.display(), e))
        })?;

        Ok(LocalStorage {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
            key_prefix,
        })
    }

    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_storage_key(key)?;
        let path = self.root.join(key);
        if !path.starts_with(&self.root) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(path)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, url_path_for_key(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredObject> {
        let key = generate_storage_key(&self.key_prefix, filename);
        let path = self.object_path(&key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let size_bytes = data.len() as u64;
        let mut partial = path.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        if let Err(e) = fs::write(&partial, &data).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::UploadFailed(format!(
                "write {}: {}",
                partial.display(),
                e
            )));
        }
        fs::rename(&partial, &path)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("rename {}: {}", path.display(), e)))?;

        tracing::debug!(key = %key, content_type, size_bytes, "Stored object on local disk");

        Ok(StoredObject {
            url: self.public_url(&key),
            key,
            size_bytes,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(
            dir,
            "http://localhost:3000/media/".to_string(),
            "uploads".to_string(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_builds_url() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let data = b"\xff\xd8\xff fake jpeg".to_vec();

        let stored = storage
            .upload("1234-beach.jpg", "image/jpeg", data.clone())
            .await
            .unwrap();

        assert_eq!(stored.key, "uploads/1234-beach.jpg");
        assert_eq!(stored.url, "http://localhost:3000/media/uploads/1234-beach.jpg");
        assert_eq!(stored.size_bytes, data.len() as u64);
        assert_eq!(
            std::fs::read(dir.path().join("uploads/1234-beach.jpg")).unwrap(),
            data
        );
        assert!(!dir.path().join("uploads/1234-beach.jpg.part").exists());
    }

    #[tokio::test]
    async fn test_url_escapes_reserved_characters() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let stored = storage
            .upload("1-party #2 ?.jpg", "image/jpeg", b"jpeg".to_vec())
            .await
            .unwrap();

        assert_eq!(stored.key, "uploads/1-party #2 ?.jpg");
        assert_eq!(
            stored.url,
            "http://localhost:3000/media/uploads/1-party%20%232%20%3F.jpg"
        );
        assert!(dir.path().join("uploads/1-party #2 ?.jpg").is_file());
    }

    #[tokio::test]
    async fn test_escaping_names_are_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.upload("../escape.jpg", "image/jpeg", vec![1]).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(result.unwrap_err().is_rejection());
    }

    #[tokio::test]
    async fn test_creates_missing_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("media/store");
        let storage = storage(&root).await;

        storage.upload("a.png", "image/png", b"png".to_vec()).await.unwrap();
        assert!(root.join("uploads/a.png").is_file());
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }
}
