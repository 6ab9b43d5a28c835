//! Single-image face verification.
//!
//! The image is forwarded to an external face-recognition service, which
//! answers with candidate file paths. Each path is reduced to its identity
//! key and resolved through the catalog; this module never writes to it.

#[cfg(feature = "http-verifier")]
mod http;

#[cfg(feature = "http-verifier")]
pub use http::HttpFaceVerifier;

use std::sync::Arc;

use async_trait::async_trait;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use pixvault_core::{identity_key, AppError, ErrorMetadata};
use pixvault_db::CatalogStore;

/// Accepts standard-alphabet base64 with or without padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// External face-recognition collaborator.
#[async_trait]
pub trait FaceVerifier: Send + Sync {
    /// Candidate file paths for the face in `image_base64`, best match first.
    async fn verify(&self, image_base64: &str) -> Result<Vec<String>, AppError>;
}

#[derive(Clone)]
pub struct VerificationAdapter {
    verifier: Arc<dyn FaceVerifier>,
    catalog: Arc<dyn CatalogStore>,
}

impl VerificationAdapter {
    pub fn new(verifier: Arc<dyn FaceVerifier>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { verifier, catalog }
    }

    /// Remote URLs of the catalog entries matching the face in `image`.
    ///
    /// `image` is bare base64 or a `data:` URL. Candidates missing from the
    /// catalog are left out; every hit is returned in the collaborator's
    /// order. A failed catalog lookup fails the whole call.
    #[tracing::instrument(skip_all, fields(payload_len = image.len()))]
    pub async fn verify_and_resolve(&self, image: &str) -> Result<Vec<String>, AppError> {
        let payload = image_payload(image)?;
        let candidates = self.verifier.verify(payload).await?;

        let mut urls = Vec::with_capacity(candidates.len());
        for path in &candidates {
            let key = identity_key(path);
            match self.catalog.lookup(key).await {
                Ok(Some(url)) => urls.push(url),
                Ok(None) => {
                    tracing::debug!(identity_key = key, "Candidate not in catalog");
                }
                Err(e) => {
                    tracing::warn!(
                        identity_key = key,
                        error = %e,
                        error_code = e.error_code(),
                        "Catalog lookup failed for candidate"
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            candidates = candidates.len(),
            resolved = urls.len(),
            "Face verification resolved"
        );
        Ok(urls)
    }
}

/// The base64 payload of a bare string or `data:<mime>;base64,<payload>` URL.
pub fn image_payload(image: &str) -> Result<&str, AppError> {
    let image = image.trim();
    let payload = if image.starts_with("data:") {
        image
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or_else(|| AppError::InvalidInput("data URL has no payload".to_string()))?
    } else {
        image
    };

    if payload.is_empty() {
        return Err(AppError::InvalidInput("image payload is empty".to_string()));
    }
    PAYLOAD_ENGINE
        .decode(payload)
        .map_err(|e| AppError::InvalidInput(format!("image payload is not valid base64: {}", e)))?;

    Ok(payload)
}
