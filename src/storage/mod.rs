//! Durable object storage
//!
//! Both the upload relay and the job resolver go through [`ObjectStore`];
//! production uses S3.

use async_trait::async_trait;
use bytes::Bytes;

pub mod s3;

pub use s3::S3ObjectStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object s3://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },
    #[error("{operation} s3://{bucket}/{key} failed: {cause}")]
    Request {
        operation: &'static str,
        bucket: String,
        key: String,
        cause: String,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError>;
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

/// `s3://bucket/key` form used when handing objects to the transcription provider
pub fn object_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}
