use std::path::Path;

use pixvault_core::{AppError, IdentityResolver};

use super::{ExtractedBatch, ExtractedEntry};

/// List the regular files directly inside `dir`, sorted by file name.
///
/// Entries point at the original files; nothing is copied or deleted.
#[tracing::instrument(skip(dir, resolver), fields(dir = %dir.display()))]
pub async fn scan_folder(
    dir: &Path,
    resolver: &IdentityResolver,
) -> Result<ExtractedBatch, AppError> {
    let metadata = tokio::fs::metadata(dir).await.map_err(|e| {
        AppError::InvalidInput(format!("Cannot read folder {}: {}", dir.display(), e))
    })?;
    if !metadata.is_dir() {
        return Err(AppError::InvalidInput(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(item) = read_dir.next_entry().await? {
        let path = item.path();
        // Follows symlinks, so linked files are included.
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        let Some(name) = item.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = %path.display(), "Skipping file with non UTF-8 name");
            continue;
        };

        entries.push(ExtractedEntry {
            identity: resolver.classify(&name),
            name,
            path,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::info!(entries = entries.len(), "Folder scanned");
    Ok(ExtractedBatch::new(entries, None))
}
