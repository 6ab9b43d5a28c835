use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use pixvault_core::{AppError, IdentityResolver, IngestConfig};
use tempfile::TempDir;
use zip::ZipArchive;

use super::paths::{resolve_target, sanitize_entry_path};
use super::{ArchiveFormat, ExtractedBatch, ExtractedEntry};

const SCRATCH_PREFIX: &str = "pixvault-batch-";

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Unpacks archives into per-batch scratch directories.
///
/// All member names are validated and the limits checked against declared
/// sizes before anything is written; actual sizes are enforced again while
/// writing.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    config: IngestConfig,
    resolver: IdentityResolver,
}

impl ArchiveExtractor {
    pub fn new(config: IngestConfig) -> Self {
        let resolver = IdentityResolver::new(&config.allowed_extensions);
        Self { config, resolver }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Extract on the blocking pool.
    #[tracing::instrument(skip(self, data), fields(archive.size_bytes = data.len()))]
    pub async fn extract(&self, data: Vec<u8>) -> Result<ExtractedBatch, AppError> {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.extract_blocking(&data))
            .await
            .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))?
    }

    pub fn extract_blocking(&self, data: &[u8]) -> Result<ExtractedBatch, AppError> {
        let format = ArchiveFormat::detect(data).ok_or_else(|| {
            AppError::CorruptArchive("unrecognized archive format".to_string())
        })?;

        // Dropping `scratch` on any early return removes the directory.
        let scratch = self.create_scratch_dir()?;
        let root = scratch.path().to_path_buf();

        let members = match format {
            ArchiveFormat::Zip => self.extract_zip(data, &root)?,
            ArchiveFormat::Tar => self.extract_tar(|| Cursor::new(data), &root)?,
            ArchiveFormat::TarGz => {
                self.extract_tar(|| GzDecoder::new(Cursor::new(data)), &root)?
            }
        };

        let entries: Vec<ExtractedEntry> = members
            .into_iter()
            .map(|(name, path)| ExtractedEntry {
                identity: self.resolver.classify(&name),
                name,
                path,
            })
            .collect();

        tracing::info!(
            format = %format,
            entries = entries.len(),
            scratch_dir = %root.display(),
            "Archive extracted"
        );

        Ok(ExtractedBatch::new(entries, Some(scratch)))
    }

    fn create_scratch_dir(&self) -> Result<TempDir, AppError> {
        let parent = &self.config.extraction_root;
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Internal(format!(
                "Failed to create extraction root {}: {}",
                parent.display(),
                e
            ))
        })?;
        tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| AppError::Internal(format!("Failed to create scratch directory: {}", e)))
    }

    fn extract_zip(&self, data: &[u8], root: &Path) -> Result<Vec<(String, PathBuf)>, AppError> {
        let mut archive = ZipArchive::new(Cursor::new(data)).map_err(corrupt)?;

        let mut declared = Limits::new(&self.config);
        let mut planned = Vec::new();
        for index in 0..archive.len() {
            let file = archive.by_index(index).map_err(corrupt)?;
            let name = sanitize_entry_path(file.name())?;
            if file.is_dir() || file.name().ends_with('\\') {
                continue;
            }
            if file
                .unix_mode()
                .map(|mode| mode & S_IFMT == S_IFLNK)
                .unwrap_or(false)
            {
                tracing::warn!(entry = %file.name(), "Skipping symlink archive member");
                continue;
            }
            if name.is_empty() {
                return Err(AppError::CorruptArchive(format!(
                    "empty member name at index {}",
                    index
                )));
            }
            declared.admit(&name, file.size())?;
            planned.push((index, name));
        }

        let mut written = Limits::new(&self.config);
        let mut members = Vec::with_capacity(planned.len());
        for (index, name) in planned {
            let target = resolve_target(root, &name)?;
            let file = archive.by_index(index).map_err(corrupt)?;
            let bytes = read_member(file, written.remaining())?;
            written.admit(&name, bytes.len() as u64)?;
            write_member(&target, &bytes)?;
            members.push((name, target));
        }

        Ok(members)
    }

    /// `open` is called once per pass; gzip streams cannot be rewound.
    fn extract_tar<R, F>(&self, open: F, root: &Path) -> Result<Vec<(String, PathBuf)>, AppError>
    where
        R: Read,
        F: Fn() -> R,
    {
        let mut declared = Limits::new(&self.config);
        let mut archive = tar::Archive::new(open());
        for entry in archive.entries().map_err(corrupt)? {
            let entry = entry.map_err(corrupt)?;
            if let Some((name, size)) = tar_member(&entry, true)? {
                declared.admit(&name, size)?;
            }
        }

        let mut written = Limits::new(&self.config);
        let mut members = Vec::new();
        let mut archive = tar::Archive::new(open());
        for entry in archive.entries().map_err(corrupt)? {
            let entry = entry.map_err(corrupt)?;
            let Some((name, _)) = tar_member(&entry, false)? else {
                continue;
            };
            let target = resolve_target(root, &name)?;
            let bytes = read_member(entry, written.remaining())?;
            written.admit(&name, bytes.len() as u64)?;
            write_member(&target, &bytes)?;
            members.push((name, target));
        }

        Ok(members)
    }
}

/// Sanitized name and declared size of a regular file member, or `None` for
/// members that are not extracted.
fn tar_member<R: Read>(
    entry: &tar::Entry<'_, R>,
    report_skips: bool,
) -> Result<Option<(String, u64)>, AppError> {
    let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
    let name = sanitize_entry_path(&raw)?;

    let kind = entry.header().entry_type();
    if kind.is_dir() {
        return Ok(None);
    }
    if !kind.is_file() {
        if report_skips {
            tracing::warn!(entry = %raw, entry_type = ?kind, "Skipping non-regular archive member");
        }
        return Ok(None);
    }
    if name.is_empty() {
        return Err(AppError::CorruptArchive(format!(
            "empty member name: {:?}",
            raw
        )));
    }

    Ok(Some((name, entry.size())))
}

fn read_member<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(corrupt)?;
    Ok(buf)
}

fn write_member(target: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Internal(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    fs::write(target, bytes)
        .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", target.display(), e)))
}

fn corrupt(err: impl std::fmt::Display) -> AppError {
    AppError::CorruptArchive(err.to_string())
}

/// Running member count and byte total against the configured caps.
struct Limits {
    max_entries: usize,
    max_bytes: u64,
    entries: usize,
    bytes: u64,
}

impl Limits {
    fn new(config: &IngestConfig) -> Self {
        Self {
            max_entries: config.max_archive_entries,
            max_bytes: config.max_extracted_bytes,
            entries: 0,
            bytes: 0,
        }
    }

    fn admit(&mut self, name: &str, size: u64) -> Result<(), AppError> {
        self.entries += 1;
        if self.entries > self.max_entries {
            return Err(AppError::ArchiveTooLarge(format!(
                "more than {} entries",
                self.max_entries
            )));
        }
        self.bytes = self.bytes.saturating_add(size);
        if self.bytes > self.max_bytes {
            return Err(AppError::ArchiveTooLarge(format!(
                "{} exceeds the {} byte extraction limit",
                name, self.max_bytes
            )));
        }
        Ok(())
    }

    fn remaining(&self) -> u64 {
        self.max_bytes.saturating_sub(self.bytes)
    }
}
