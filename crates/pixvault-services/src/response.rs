//! Serializable responses for the ingestion and verification operations.

use pixvault_core::{AppError, BatchResult, BatchSummary, ErrorMetadata};
use serde::{Deserialize, Serialize};

pub const INGEST_SUCCESS_MESSAGE: &str = "Images uploaded and saved to catalog";
pub const VERIFY_SUCCESS_MESSAGE: &str = "Face verification successful";

/// Response to an archive or folder submission. Skipped and failed entries
/// are not in `urls` but are counted in `summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub urls: Vec<String>,
    pub summary: BatchSummary,
}

impl From<&BatchResult> for IngestResponse {
    fn from(result: &BatchResult) -> Self {
        Self {
            message: INGEST_SUCCESS_MESSAGE.to_string(),
            urls: result.urls(),
            summary: result.summary(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub message: String,
    pub ok: bool,
    pub urls: Vec<String>,
}

impl VerifyResponse {
    pub fn success(urls: Vec<String>) -> Self {
        Self {
            message: VERIFY_SUCCESS_MESSAGE.to_string(),
            ok: true,
            urls,
        }
    }
}

/// Client-facing error. Internal details stay in the logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub error_code: String,
    pub recoverable: bool,
}

impl From<&AppError> for ErrorBody {
    fn from(error: &AppError) -> Self {
        Self {
            message: error.client_message(),
            error_code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
        }
    }
}
