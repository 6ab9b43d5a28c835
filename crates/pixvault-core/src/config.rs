//! Configuration module
//!
//! Configuration is loaded once at startup and passed explicitly into the
//! constructors of the catalog, the media store, the extractor and the
//! verification client. Nothing reads the environment after that.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::identity::DEFAULT_IMAGE_EXTENSIONS;
use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const CATALOG_TIMEOUT_SECS: u64 = 10;
const UPLOAD_TIMEOUT_SECS: u64 = 60;
const MAX_UPLOAD_SIZE_MB: usize = 25;
const MAX_ARCHIVE_ENTRIES: usize = 10_000;
const MAX_EXTRACTED_SIZE_MB: u64 = 4096;
const FACE_VERIFY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FACE_VERIFY_URL: &str = "http://localhost:8000/face_verify";
const DEFAULT_UPLOAD_KEY_PREFIX: &str = "uploads";
const MIB: u64 = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub timeout_seconds: u64,
    /// Upper bound for a single catalog lookup or upsert.
    pub catalog_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    // Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub key_prefix: String,
    pub upload_timeout_secs: u64,
    pub max_upload_size_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub allowed_extensions: Vec<String>,
    /// Parent directory for per-batch scratch directories.
    pub extraction_root: PathBuf,
    pub max_archive_entries: usize,
    pub max_extracted_bytes: u64,
}

#[derive(Clone, Debug)]
pub struct VerificationConfig {
    pub url: String,
    pub user_id: String,
    pub client_secret: String,
    pub timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub log_format: LogFormat,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
    pub verification: VerificationConfig,
}

impl Config {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an explicit map of variables. Used by tests.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_or = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let log_format = match lookup("LOG_FORMAT")
            .unwrap_or_else(|| "text".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL"),
            max_connections: parse_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS as u64) as u32,
            timeout_seconds: parse_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            catalog_timeout_secs: parse_or("CATALOG_TIMEOUT_SECS", CATALOG_TIMEOUT_SECS),
        };

        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION").or_else(|| lookup("AWS_REGION")),
            s3_endpoint: lookup("S3_ENDPOINT"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
            key_prefix: lookup("UPLOAD_KEY_PREFIX")
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_UPLOAD_KEY_PREFIX.to_string()),
            upload_timeout_secs: parse_or("UPLOAD_TIMEOUT_SECS", UPLOAD_TIMEOUT_SECS),
            max_upload_size_bytes: usize::try_from(
                parse_or("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB as u64).saturating_mul(MIB),
            )
            .unwrap_or(usize::MAX),
        };

        let allowed_extensions = lookup("ALLOWED_EXTENSIONS")
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                DEFAULT_IMAGE_EXTENSIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let ingest = IngestConfig {
            allowed_extensions,
            extraction_root: lookup("EXTRACTION_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            max_archive_entries: parse_or("MAX_ARCHIVE_ENTRIES", MAX_ARCHIVE_ENTRIES as u64)
                as usize,
            max_extracted_bytes: parse_or("MAX_EXTRACTED_SIZE_MB", MAX_EXTRACTED_SIZE_MB)
                .saturating_mul(MIB),
        };

        let verification = VerificationConfig {
            url: lookup("FACE_VERIFY_URL").unwrap_or_else(|| DEFAULT_FACE_VERIFY_URL.to_string()),
            user_id: lookup("FACE_VERIFY_USER_ID").unwrap_or_default(),
            client_secret: lookup("FACE_VERIFY_CLIENT_SECRET").unwrap_or_default(),
            timeout_secs: parse_or("FACE_VERIFY_TIMEOUT_SECS", FACE_VERIFY_TIMEOUT_SECS),
        };

        Ok(Config {
            environment,
            log_format,
            database,
            storage,
            ingest,
            verification,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!("S3_BUCKET must be set when STORAGE_BACKEND=s3"));
                }
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none()
                    || self.storage.local_storage_base_url.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
        }

        if self.ingest.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }
        if self.ingest.max_archive_entries == 0 || self.ingest.max_extracted_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_ARCHIVE_ENTRIES and MAX_EXTRACTED_SIZE_MB must be greater than zero"
            ));
        }
        if self.storage.upload_timeout_secs == 0 || self.database.catalog_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_TIMEOUT_SECS and CATALOG_TIMEOUT_SECS must be greater than zero"
            ));
        }
        if self.is_production() && self.verification.client_secret.is_empty() {
            return Err(anyhow::anyhow!(
                "FACE_VERIFY_CLIENT_SECRET must be set in production"
            ));
        }

        Ok(())
    }

    /// Database URL, required whenever the Postgres catalog is used.
    pub fn database_url(&self) -> Result<&str, anyhow::Error> {
        self.database
            .url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))
    }
}
