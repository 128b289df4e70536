//! S3-backed [`ObjectStore`]

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{ObjectStore, StorageError};

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

fn request_error<E>(operation: &'static str, bucket: &str, key: &str, err: E) -> StorageError
where
    E: std::error::Error + 'static,
{
    StorageError::Request {
        operation,
        bucket: bucket.to_string(),
        key: key.to_string(),
        cause: DisplayErrorContext(&err).to_string(),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| request_error("PutObject", bucket, key, e))?;

        log::debug!("[S3] Stored {} bytes at s3://{}/{}", size, bucket, key);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if matches!(e.as_service_error(), Some(GetObjectError::NoSuchKey(_))) {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    request_error("GetObject", bucket, key, e)
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| request_error("GetObject", bucket, key, e))?;

        Ok(data.into_bytes())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| request_error("DeleteObject", bucket, key, e))?;

        log::debug!("[S3] Deleted s3://{}/{}", bucket, key);
        Ok(())
    }
}
