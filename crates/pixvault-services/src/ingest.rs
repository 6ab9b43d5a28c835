//! Ingestion orchestration: extract, classify, deduplicate, upload, record.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use pixvault_core::{AppError, BatchResult, EntryOutcome, EntryStatus, ErrorMetadata, LogLevel};
use pixvault_db::CatalogStore;
use pixvault_infra::{scan_folder, ArchiveExtractor, ExtractedBatch, ExtractedEntry};
use uuid::Uuid;

use crate::gateway::UploadGateway;

/// Runs ingestion batches.
///
/// Entries of one batch are processed sequentially in extraction order.
/// Independent batches may run concurrently on clones of the same
/// orchestrator; the catalog's unique key is the only coordination between
/// them.
#[derive(Clone)]
pub struct IngestionOrchestrator {
    extractor: ArchiveExtractor,
    catalog: Arc<dyn CatalogStore>,
    gateway: UploadGateway,
}

enum Resolution {
    Existing(String),
    Uploaded(String),
}

impl IngestionOrchestrator {
    pub fn new(
        extractor: ArchiveExtractor,
        catalog: Arc<dyn CatalogStore>,
        gateway: UploadGateway,
    ) -> Self {
        Self {
            extractor,
            catalog,
            gateway,
        }
    }

    /// Ingest an archive. Extraction failure aborts the whole batch with
    /// `IngestionAborted`; after that every entry gets an outcome.
    pub async fn ingest_archive(&self, data: Vec<u8>) -> Result<BatchResult, AppError> {
        let batch = self.extractor.extract(data).await.map_err(abort)?;
        Ok(self.process_batch(&batch).await)
    }

    /// Ingest the files at the top level of `dir`. The files are left in place.
    pub async fn ingest_folder(&self, dir: &Path) -> Result<BatchResult, AppError> {
        let batch = scan_folder(dir, self.extractor.resolver())
            .await
            .map_err(abort)?;
        Ok(self.process_batch(&batch).await)
    }

    #[tracing::instrument(skip_all, fields(batch_id = %Uuid::new_v4(), entries = batch.len()))]
    pub async fn process_batch(&self, batch: &ExtractedBatch) -> BatchResult {
        let mut result = BatchResult::new();
        let mut resolved: HashMap<&str, EntryOutcome> = HashMap::new();

        for entry in batch.entries() {
            let key = entry.identity.identity_key.as_str();

            let outcome = if !entry.identity.is_image {
                EntryOutcome::skipped(key, entry.name.as_str())
            } else if let Some(first) = resolved.get(key) {
                first.for_duplicate(entry.name.as_str())
            } else {
                let outcome = self.process_entry(entry).await;
                resolved.insert(key, outcome.clone());
                outcome
            };

            log_outcome(&outcome);
            result.push(outcome);
        }

        let summary = result.summary();
        tracing::info!(
            total = summary.total,
            skipped = summary.skipped,
            already_present = summary.already_present,
            uploaded = summary.uploaded,
            failed = summary.failed,
            "Batch processed"
        );

        result
    }

    async fn process_entry(&self, entry: &ExtractedEntry) -> EntryOutcome {
        let key = entry.identity.identity_key.as_str();
        match self.resolve_entry(entry).await {
            Ok(Resolution::Existing(url)) => EntryOutcome::already_present(key, entry.name.as_str(), url),
            Ok(Resolution::Uploaded(url)) => EntryOutcome::uploaded(key, entry.name.as_str(), url),
            Err(e) => {
                log_entry_error(key, &e);
                EntryOutcome::failed(key, entry.name.as_str(), &e)
            }
        }
    }

    /// Lookup, then upload and record on a miss. The catalog is only
    /// written after the store confirmed the upload.
    async fn resolve_entry(&self, entry: &ExtractedEntry) -> Result<Resolution, AppError> {
        let key = entry.identity.identity_key.as_str();

        if let Some(url) = self.catalog.lookup(key).await? {
            return Ok(Resolution::Existing(url));
        }

        let data = entry.read().await?;
        let url = self.gateway.upload(data, key).await?;
        self.catalog.upsert(key, &url).await?;

        Ok(Resolution::Uploaded(url))
    }
}

fn abort(err: AppError) -> AppError {
    tracing::warn!(error = %err, error_code = err.error_code(), "Ingestion aborted");
    AppError::IngestionAborted(Box::new(err))
}

fn log_outcome(outcome: &EntryOutcome) {
    match outcome.status {
        EntryStatus::Skipped => {
            tracing::debug!(identity_key = %outcome.identity_key, name = %outcome.name, "Skipped non-image entry");
        }
        EntryStatus::AlreadyPresent | EntryStatus::Uploaded => {
            tracing::info!(
                identity_key = %outcome.identity_key,
                status = ?outcome.status,
                url = outcome.url.as_deref().unwrap_or_default(),
                "Entry resolved"
            );
        }
        EntryStatus::Failed => {
            tracing::info!(
                identity_key = %outcome.identity_key,
                error_code = outcome.error_code.as_deref().unwrap_or_default(),
                error = outcome.error.as_deref().unwrap_or_default(),
                "Entry failed"
            );
        }
    }
}

fn log_entry_error(identity_key: &str, error: &AppError) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(identity_key, error = %error, error_code, "Entry processing failed");
        }
        LogLevel::Warn => {
            tracing::warn!(identity_key, error = %error, error_code, "Entry processing failed");
        }
        LogLevel::Error => {
            tracing::error!(identity_key, error = %error, error_code, "Entry processing failed");
        }
    }
}
