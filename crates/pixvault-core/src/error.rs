//! Error types module
//!
//! All failures of the ingestion pipeline are unified under [`AppError`]. The
//! variants fall into three groups:
//!
//! - batch-fatal: `CorruptArchive`, `PathTraversal`, `ArchiveTooLarge`, `IngestionAborted`
//! - entry-level: `StoreUnavailable`, `UploadRejected`, `UploadUnavailable`
//! - request-fatal: `VerificationUnavailable`, `InvalidInput`
//!
//! The `From<sqlx::Error>` conversion is gated behind the `sqlx` feature.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like transient outages
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORE_UNAVAILABLE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the caller
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("Archive entry escapes extraction root: {0}")]
    PathTraversal(String),

    #[error("Archive too large: {0}")]
    ArchiveTooLarge(String),

    #[error("Ingestion aborted: {0}")]
    IngestionAborted(#[source] Box<AppError>),

    #[error("Catalog store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("Upload unavailable: {0}")]
    UploadUnavailable(String),

    #[error("Face verification unavailable: {0}")]
    VerificationUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StoreUnavailable(err.to_string())
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::CorruptArchive(_) => (
            "CORRUPT_ARCHIVE",
            false,
            Some("Upload a valid zip or tar archive"),
            LogLevel::Warn,
        ),
        AppError::PathTraversal(_) => (
            "PATH_TRAVERSAL",
            false,
            Some("Remove entries with absolute paths or '..' components"),
            LogLevel::Warn,
        ),
        AppError::ArchiveTooLarge(_) => (
            "ARCHIVE_TOO_LARGE",
            false,
            Some("Split the archive into smaller batches"),
            LogLevel::Warn,
        ),
        AppError::IngestionAborted(inner) => {
            let (_, recoverable, action, level) = app_error_static_metadata(inner);
            ("INGESTION_ABORTED", recoverable, action, level)
        }
        AppError::StoreUnavailable(_) => (
            "STORE_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::UploadRejected(_) => (
            "UPLOAD_REJECTED",
            false,
            Some("Check the file content and size"),
            LogLevel::Warn,
        ),
        AppError::UploadUnavailable(_) => (
            "UPLOAD_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::VerificationUnavailable(_) => (
            "VERIFICATION_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            LogLevel::Debug,
        ),
        AppError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check environment configuration"),
            LogLevel::Error,
        ),
        AppError::Internal(_) => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Whether this error stops a whole batch rather than a single entry.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            AppError::CorruptArchive(_)
                | AppError::PathTraversal(_)
                | AppError::ArchiveTooLarge(_)
                | AppError::IngestionAborted(_)
        )
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::CorruptArchive(_) => "Error uploading and extracting archive".to_string(),
            AppError::PathTraversal(ref name) => {
                format!("Archive entry '{}' is not allowed", name)
            }
            AppError::ArchiveTooLarge(ref msg) => msg.clone(),
            AppError::IngestionAborted(inner) => inner.client_message(),
            AppError::StoreUnavailable(_) => "Failed to access catalog".to_string(),
            AppError::UploadRejected(ref msg) => msg.clone(),
            AppError::UploadUnavailable(_) => "Failed to access media store".to_string(),
            AppError::VerificationUnavailable(_) => "Face verification failed".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Config(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal error".to_string(),
        }
    }
}
