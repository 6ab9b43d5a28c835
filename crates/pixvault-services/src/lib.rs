//! pixvault Services Layer
//!
//! This crate hosts the ingestion pipeline and the verification lookup, and
//! re-exports the storage, catalog and extraction types they are built from
//! so that front ends depend on a single service facade.

pub mod gateway;
pub mod ingest;
pub mod response;
pub mod verification;

pub use gateway::UploadGateway;
pub use ingest::IngestionOrchestrator;
pub use response::{ErrorBody, IngestResponse, VerifyResponse};
#[cfg(feature = "http-verifier")]
pub use verification::HttpFaceVerifier;
pub use verification::{image_payload, FaceVerifier, VerificationAdapter};

pub use pixvault_db::{
    run_migrations, setup_database, CatalogStore, MemoryCatalogStore, PostgresCatalogStore,
};
pub use pixvault_infra::{scan_folder, ArchiveExtractor, ArchiveFormat, ExtractedBatch};
#[cfg(feature = "storage-local")]
pub use pixvault_storage::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use pixvault_storage::S3Storage;
pub use pixvault_storage::{
    create_storage, Storage, StorageBackend, StorageError, StorageResult, StoredObject,
};
