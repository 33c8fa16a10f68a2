//! Storage gateway for LensPool
//!
//! Issues time-boxed presigned PUT credentials against an S3-compatible
//! object store (Cloudflare R2 in production) and derives public and
//! thumbnail paths. Clients upload file bytes directly to the store; this
//! service never touches them.

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::ApiError;

/// Storage gateway errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to presign upload URL: {0}")]
    PresignFailed(String),

    #[error("Invalid presign TTL: {0}")]
    InvalidTtl(String),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::ExternalServiceError(e.to_string())
    }
}

/// A time-boxed write credential scoped to exactly one storage path
#[derive(Debug, Clone)]
pub struct UploadCredential {
    pub upload_id: Uuid,
    pub upload_url: String,
    pub storage_path: String,
    pub expires_at: DateTime<Utc>,
}

/// Storage gateway backed by an S3-compatible store
#[derive(Clone)]
pub struct StorageService {
    client: Client,
    bucket: String,
    public_url: String,
}

impl StorageService {
    /// Build an S3 client for the configured endpoint with static credentials
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "lenspool-static",
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if !config.endpoint.is_empty() {
            builder = builder.endpoint_url(&config.endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Issue a presigned PUT credential for a fresh upload
    ///
    /// The storage path is namespaced by user and upload id and preserves
    /// the original file extension. Content-type acceptance is enforced by
    /// the caller, not here.
    pub async fn issue_upload_credential(
        &self,
        user_id: Uuid,
        filename: &str,
        content_type: &str,
        ttl_seconds: u64,
    ) -> Result<UploadCredential, StorageError> {
        let upload_id = Uuid::new_v4();
        let storage_path = derive_storage_path(user_id, upload_id, filename);

        let presign_config =
            PresigningConfig::expires_in(std::time::Duration::from_secs(ttl_seconds))
                .map_err(|e| StorageError::InvalidTtl(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&storage_path)
            .content_type(content_type)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(UploadCredential {
            upload_id,
            upload_url: presigned.uri().to_string(),
            storage_path,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds as i64),
        })
    }

    /// Public URL for a stored file
    pub fn public_url(&self, storage_path: &str) -> String {
        format!("{}/{}", self.public_url, storage_path.trim_start_matches('/'))
    }
}

/// Derive the storage key for an upload: raw-uploads/{user}/{upload}.{ext}
pub fn derive_storage_path(user_id: Uuid, upload_id: Uuid, filename: &str) -> String {
    format!(
        "raw-uploads/{}/{}.{}",
        user_id,
        upload_id,
        file_extension(filename)
    )
}

/// Thumbnail path for a stored file: insert `_thumb` before the extension
pub fn thumbnail_path(storage_path: &str) -> String {
    match storage_path.rsplit_once('.') {
        Some((base, ext)) => format!("{}_thumb.{}", base, ext),
        None => format!("{}_thumb", storage_path),
    }
}

fn file_extension(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("jpg")
}
