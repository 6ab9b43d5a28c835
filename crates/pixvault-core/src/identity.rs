//! Identity resolution for ingested files.
//!
//! An identity key is the final path segment of an entry name. Two files with
//! the same base name are the same image as far as the catalog is concerned,
//! regardless of which directory of the archive they came from.

use serde::Serialize;

/// Extensions accepted as images when no override is configured.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic"];

/// Result of classifying one entry name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub identity_key: String,
    pub is_image: bool,
}

/// Classifies entry names against an extension allow-list.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    extensions: Vec<String>,
}

impl IdentityResolver {
    /// Create a resolver with a custom allow-list. Extensions are matched
    /// case-insensitively and may be given with or without a leading dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn classify(&self, name: &str) -> Identity {
        let identity_key = identity_key(name).to_string();
        let is_image = extension(&identity_key)
            .map(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
            .unwrap_or(false);
        Identity {
            identity_key,
            is_image,
        }
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_EXTENSIONS)
    }
}

/// Classify `name` with the default allow-list.
pub fn classify(name: &str) -> Identity {
    IdentityResolver::default().classify(name)
}

/// Final path segment of `name`. Both `/` and `\` count as separators so that
/// archives produced on Windows resolve to the same key.
pub fn identity_key(name: &str) -> &str {
    let trimmed = name.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Lowercased extension without the dot. Dotfiles such as `.jpg` have none.
fn extension(file_name: &str) -> Option<String> {
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(file_name[idx + 1..].to_lowercase()),
    }
}

/// MIME type sent to the media store for an entry.
pub fn content_type_for(name: &str) -> &'static str {
    match extension(identity_key(name)).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
