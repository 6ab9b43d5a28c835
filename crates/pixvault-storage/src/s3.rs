//! S3 and S3-compatible (MinIO, Spaces, R2) media store.

use crate::keys::{generate_storage_key, url_path_for_key, validate_storage_key};
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    public_base: String,
    key_prefix: String,
}

impl S3Storage {
    /// Credentials come from the standard AWS environment variables.
    ///
    /// With an `endpoint_url` objects are addressed path-style
    /// (`{endpoint}/{bucket}/{key}`); without one the AWS virtual-hosted URL
    /// is used.
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        key_prefix: String,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        let public_base = match endpoint_url.as_deref() {
            Some(endpoint) => {
                builder = builder
                    .with_endpoint(endpoint)
                    .with_allow_http(endpoint.starts_with("http://"));
                format!("{}/{}", endpoint.trim_end_matches('/'), bucket)
            }
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            public_base,
            key_prefix,
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, url_path_for_key(key))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredObject> {
        let key = generate_storage_key(&self.key_prefix, filename);
        validate_storage_key(&key)?;

        let size_bytes = data.len() as u64;
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let start = Instant::now();
        self.store
            .put_opts(
                &Path::from(key.as_str()),
                PutPayload::from(Bytes::from(data)),
                options,
            )
            .await
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes,
                    "S3 put failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Stored object in S3"
        );

        Ok(StoredObject {
            url: self.public_url(&key),
            key,
            size_bytes,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
