//! pixvault Infrastructure Library
//!
//! This crate provides the pieces of the ingestion pipeline that touch the
//! local machine:
//! - Archive extraction into per-batch scratch directories
//! - Folder snapshot scanning
//! - Telemetry initialization

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "archive")]
pub mod archive;

#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

#[cfg(feature = "archive")]
pub use archive::{
    sanitize_entry_path, scan_folder, ArchiveExtractor, ArchiveFormat, ExtractedBatch,
    ExtractedEntry,
};
