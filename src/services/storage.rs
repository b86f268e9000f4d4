use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use crate::models::extraction::DocumentLocation;

/// Object storage the extraction service reads documents from.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<DocumentLocation, StorageError>;
}

/// S3 bucket client.
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    /// Create a client. An empty `endpoint` uses the AWS endpoint for `region`.
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, StorageError> {
        let region = if endpoint.is_empty() {
            region
                .parse::<Region>()
                .map_err(|e| StorageError::Config(e.to_string()))?
        } else {
            Region::Custom {
                region: region.to_string(),
                endpoint: endpoint.to_string(),
            }
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self { bucket })
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Delete an object (used by the connectivity check).
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.bucket.delete_object(key).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for S3Store {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<DocumentLocation, StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Rejected(status));
        }

        tracing::debug!(key, bytes = data.len(), "Document uploaded");
        Ok(DocumentLocation {
            bucket: self.bucket.name(),
            key: key.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("S3 rejected upload with status {0}")]
    Rejected(u16),

    #[error("Storage configuration error: {0}")]
    Config(String),
}
