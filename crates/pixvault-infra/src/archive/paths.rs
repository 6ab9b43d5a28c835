use std::path::{Path, PathBuf};

use pixvault_core::AppError;

/// Normalize an archive member name into a relative `/`-separated path.
///
/// Both `/` and `\` separate segments; empty and `.` segments are dropped.
/// Absolute names, drive prefixes, `..` segments and NUL bytes are rejected
/// with `PathTraversal`. The result may be empty (e.g. for `./`).
pub fn sanitize_entry_path(raw: &str) -> Result<String, AppError> {
    let traversal = || AppError::PathTraversal(raw.to_string());

    if raw.contains('\0') || raw.starts_with('/') || raw.starts_with('\\') {
        return Err(traversal());
    }

    let mut chars = raw.chars();
    if let (Some(drive), Some(':')) = (chars.next(), chars.next()) {
        if drive.is_ascii_alphabetic() {
            return Err(traversal());
        }
    }

    let mut segments = Vec::new();
    for segment in raw.split(|c: char| c == '/' || c == '\\') {
        match segment {
            "" | "." => continue,
            ".." => return Err(traversal()),
            s => segments.push(s),
        }
    }

    Ok(segments.join("/"))
}

/// Join a sanitized name onto the scratch root and confirm it stays inside.
pub(crate) fn resolve_target(root: &Path, name: &str) -> Result<PathBuf, AppError> {
    let target = root.join(name);
    if !target.starts_with(root) || target == root {
        return Err(AppError::PathTraversal(name.to_string()));
    }
    Ok(target)
}
