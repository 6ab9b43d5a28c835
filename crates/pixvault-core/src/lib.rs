//! pixvault Core Library
//!
//! Domain models, the error taxonomy, identity resolution and configuration
//! shared by every pixvault crate.

pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    Config, DatabaseConfig, IngestConfig, LogFormat, StorageConfig, VerificationConfig,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use identity::{classify, content_type_for, identity_key, Identity, IdentityResolver};
pub use models::{BatchResult, BatchSummary, CatalogEntry, EntryOutcome, EntryStatus};
pub use storage_types::StorageBackend;
