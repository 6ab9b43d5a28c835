//! Archive extraction and folder scanning.
//!
//! Both produce an [`ExtractedBatch`]: an ordered list of entries whose bytes
//! live on disk. For archives the bytes sit in a scratch directory owned by
//! the batch and removed when the batch is dropped.

mod extractor;
mod folder;
mod paths;

pub use extractor::ArchiveExtractor;
pub use folder::scan_folder;
pub use paths::sanitize_entry_path;

use std::fmt;
use std::path::{Path, PathBuf};

use pixvault_core::{AppError, Identity};
use tempfile::TempDir;

/// Archive container format, detected from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06") {
            Some(ArchiveFormat::Zip)
        } else if data.starts_with(&[0x1f, 0x8b]) {
            Some(ArchiveFormat::TarGz)
        } else if data.len() >= 262 && &data[257..262] == b"ustar" {
            Some(ArchiveFormat::Tar)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archive member or folder file.
#[derive(Debug, Clone)]
pub struct ExtractedEntry {
    /// Sanitized relative name, `/`-separated.
    pub name: String,
    pub path: PathBuf,
    pub identity: Identity,
}

impl ExtractedEntry {
    pub async fn read(&self) -> Result<Vec<u8>, AppError> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            AppError::Internal(format!("Failed to read {}: {}", self.path.display(), e))
        })
    }
}

/// Entries of one batch, plus the scratch directory holding them (if any).
#[derive(Debug)]
pub struct ExtractedBatch {
    entries: Vec<ExtractedEntry>,
    scratch: Option<TempDir>,
}

impl ExtractedBatch {
    pub(crate) fn new(entries: Vec<ExtractedEntry>, scratch: Option<TempDir>) -> Self {
        Self { entries, scratch }
    }

    pub fn entries(&self) -> &[ExtractedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Directory removed on drop. `None` for folder snapshots.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|dir| dir.path())
    }
}
