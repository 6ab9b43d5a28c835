//! Wiring shared by the `pixvault` binary: building the pipeline from
//! configuration and rendering results.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use pixvault_core::{AppError, Config};
use pixvault_services::{
    create_storage, setup_database, ArchiveExtractor, CatalogStore, ErrorBody, HttpFaceVerifier,
    IngestionOrchestrator, MemoryCatalogStore, PostgresCatalogStore, UploadGateway,
    VerificationAdapter,
};
use serde::Serialize;

/// Initialize tracing for the CLI.
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    pixvault_infra::init_telemetry(&config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

/// Postgres catalog (migrations applied on connect), or an in-memory one.
pub async fn build_catalog(config: &Config, memory: bool) -> Result<Arc<dyn CatalogStore>, AppError> {
    if memory {
        tracing::info!("Using in-memory catalog; entries are discarded on exit");
        return Ok(Arc::new(MemoryCatalogStore::new()));
    }

    let url = config
        .database_url()
        .map_err(|e| AppError::Config(e.to_string()))?;
    let pool = setup_database(&config.database, url)
        .await
        .map_err(|e| AppError::StoreUnavailable(format!("{:#}", e)))?;

    Ok(Arc::new(PostgresCatalogStore::new(
        pool,
        Duration::from_secs(config.database.catalog_timeout_secs),
    )))
}

pub async fn build_orchestrator(
    config: &Config,
    catalog: Arc<dyn CatalogStore>,
) -> Result<IngestionOrchestrator, AppError> {
    config
        .validate()
        .map_err(|e| AppError::Config(e.to_string()))?;

    let storage = create_storage(&config.storage)
        .await
        .map_err(|e| AppError::Config(e.to_string()))?;
    let gateway = UploadGateway::from_config(storage, &config.storage);
    let extractor = ArchiveExtractor::new(config.ingest.clone());

    Ok(IngestionOrchestrator::new(extractor, catalog, gateway))
}

pub fn build_verification(
    config: &Config,
    catalog: Arc<dyn CatalogStore>,
) -> Result<VerificationAdapter, AppError> {
    let verifier = HttpFaceVerifier::new(&config.verification)
        .map_err(|e| AppError::Config(format!("{:#}", e)))?;
    Ok(VerificationAdapter::new(Arc::new(verifier), catalog))
}

/// Standard base64 of raw image bytes, as sent to the verification service.
pub fn encode_image(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Error body printed on failure. Pipeline errors keep their code; anything
/// else is reported as an internal error with its full message.
pub fn error_body(err: &anyhow::Error) -> ErrorBody {
    match err.downcast_ref::<AppError>() {
        Some(app_error) => ErrorBody::from(app_error),
        None => ErrorBody {
            message: format!("{:#}", err),
            error_code: "INTERNAL_ERROR".to_string(),
            recoverable: false,
        },
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{}", out);
    Ok(())
}
