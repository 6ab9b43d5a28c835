use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pixvault_core::{AppError, VerificationConfig};
use reqwest::StatusCode;
use serde::Serialize;

use super::FaceVerifier;

const IMAGE_NAME: &str = "callback";

#[derive(Serialize)]
struct VerifyRequest<'a> {
    #[serde(rename = "Image_Name")]
    image_name: &'a str,
    #[serde(rename = "Image_Base64")]
    image_base64: &'a str,
}

/// Face verification over HTTP.
///
/// Sends `{"Image_Name": "callback", "Image_Base64": ...}` with the static
/// `userid` and `clientsecretkey` headers. Only a 200 carrying a JSON array
/// of path strings counts as an answer.
pub struct HttpFaceVerifier {
    http_client: reqwest::Client,
    url: String,
    user_id: String,
    client_secret: String,
}

impl Debug for HttpFaceVerifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("HttpFaceVerifier")
            .field("url", &self.url)
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl HttpFaceVerifier {
    pub fn new(config: &VerificationConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client for face verification")?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
            user_id: config.user_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }
}

#[async_trait]
impl FaceVerifier for HttpFaceVerifier {
    async fn verify(&self, image_base64: &str) -> Result<Vec<String>, AppError> {
        let start = std::time::Instant::now();
        let request = VerifyRequest {
            image_name: IMAGE_NAME,
            image_base64,
        };

        let response = self
            .http_client
            .post(&self.url)
            .header("userid", &self.user_id)
            .header("clientsecretkey", &self.client_secret)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::VerificationUnavailable(format!("request to {} failed: {}", self.url, e))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = status.as_u16(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Face verification service returned an error"
            );
            return Err(AppError::VerificationUnavailable(format!(
                "{} - {}",
                status, error_text
            )));
        }

        let paths: Vec<String> = response.json().await.map_err(|e| {
            AppError::VerificationUnavailable(format!("undecodable response: {}", e))
        })?;

        tracing::debug!(
            candidates = paths.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Face verification service answered"
        );
        Ok(paths)
    }
}
