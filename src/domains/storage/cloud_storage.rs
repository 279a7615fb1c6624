use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use log::debug;

use super::file_storage_service::{FileStorageError, FileStorageResult, FileStorageService};

/// Writes each export as a single object in an S3 bucket.
pub struct S3FileStorageService {
    client: S3Client,
    bucket: String,
}

impl S3FileStorageService {
    pub fn new(client: S3Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    /// Client built from the default credential chain (environment, profile, instance role).
    pub async fn from_env(bucket: &str) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(S3Client::new(&aws_config), bucket)
    }
}

#[async_trait]
impl FileStorageService for S3FileStorageService {
    async fn put(&self, key: &str, data: Vec<u8>) -> FileStorageResult<u64> {
        debug!("writing file to bucket: {}", self.bucket);
        let size = data.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                FileStorageError::ObjectStore(format!(
                    "Failed to upload s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(size)
    }

    fn describe(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}
