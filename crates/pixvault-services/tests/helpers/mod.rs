//! Test helpers: in-memory media store, failing catalog, fixture archives.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pixvault_core::{AppError, CatalogEntry, IngestConfig};
use pixvault_services::{
    ArchiveExtractor, CatalogStore, IngestionOrchestrator, MemoryCatalogStore, Storage,
    StorageBackend, StorageError, StorageResult, StoredObject, UploadGateway,
};
use zip::write::{FileOptions, ZipWriter};

/// Media store that keeps uploads in memory. Uploads whose original name is
/// in `failing` fail with a backend error.
#[derive(Default)]
pub struct MemoryStorage {
    uploads: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    failing: HashSet<String>,
}

impl MemoryStorage {
    pub fn failing_for(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(
        &self,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredObject> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        // Stored names are `{uuid}-{original}`.
        let original = filename.get(37..).unwrap_or(filename);
        if self.failing.contains(original) {
            return Err(StorageError::BackendError("media store unavailable".to_string()));
        }
        let key = format!("uploads/{}", filename);
        self.uploads.lock().unwrap().push(key.clone());
        Ok(StoredObject {
            url: format!("https://cdn.test/{}", key),
            key,
            size_bytes: data.len() as u64,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Catalog whose every call fails as if the database were down.
pub struct UnavailableCatalog;

#[async_trait]
impl CatalogStore for UnavailableCatalog {
    async fn lookup(&self, _identity_key: &str) -> Result<Option<String>, AppError> {
        Err(AppError::StoreUnavailable("connection refused".to_string()))
    }

    async fn upsert(&self, _identity_key: &str, _remote_url: &str) -> Result<(), AppError> {
        Err(AppError::StoreUnavailable("connection refused".to_string()))
    }

    async fn get(&self, _identity_key: &str) -> Result<Option<CatalogEntry>, AppError> {
        Err(AppError::StoreUnavailable("connection refused".to_string()))
    }

    async fn count(&self) -> Result<u64, AppError> {
        Err(AppError::StoreUnavailable("connection refused".to_string()))
    }
}

/// Catalog that reads normally but refuses to record the given keys.
pub struct UpsertFailingCatalog {
    inner: MemoryCatalogStore,
    failing: HashSet<String>,
}

impl UpsertFailingCatalog {
    pub fn for_keys(keys: &[&str]) -> Self {
        Self {
            inner: MemoryCatalogStore::new(),
            failing: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CatalogStore for UpsertFailingCatalog {
    async fn lookup(&self, identity_key: &str) -> Result<Option<String>, AppError> {
        self.inner.lookup(identity_key).await
    }

    async fn upsert(&self, identity_key: &str, remote_url: &str) -> Result<(), AppError> {
        if self.failing.contains(identity_key) {
            return Err(AppError::StoreUnavailable("write timed out".to_string()));
        }
        self.inner.upsert(identity_key, remote_url).await
    }

    async fn get(&self, identity_key: &str) -> Result<Option<CatalogEntry>, AppError> {
        self.inner.get(identity_key).await
    }

    async fn count(&self) -> Result<u64, AppError> {
        self.inner.count().await
    }
}

pub fn ingest_config(extraction_root: &Path) -> IngestConfig {
    IngestConfig {
        allowed_extensions: ["jpg", "jpeg", "png", "gif", "webp", "heic"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        extraction_root: extraction_root.to_path_buf(),
        max_archive_entries: 100,
        max_extracted_bytes: 10 * 1024 * 1024,
    }
}

pub fn orchestrator(
    storage: Arc<dyn Storage>,
    catalog: Arc<dyn CatalogStore>,
    extraction_root: &Path,
) -> IngestionOrchestrator {
    let gateway = UploadGateway::new(storage, Duration::from_secs(5), 1024 * 1024);
    IngestionOrchestrator::new(
        ArchiveExtractor::new(ingest_config(extraction_root)),
        catalog,
        gateway,
    )
}

pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
