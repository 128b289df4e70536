//! Real service context for the HTTP server
//!
//! Implements ServiceContext with the upload relay and job resolver wired to
//! S3 and AWS Transcribe Medical.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use super::http::ServiceContext;
use crate::config::ServiceConfig;
use crate::storage::{ObjectStore, S3ObjectStore};
use crate::transcription::{
    JobResolver, JobStatusView, MedicalTranscribe, ResolveError, TranscriptionProvider,
    UploadError, UploadRelay,
};

/// Relay and resolver sharing one store and one provider.
///
/// Holds no mutable state, so it is shared across requests without a lock.
pub struct TranscriptionContext {
    relay: UploadRelay,
    resolver: JobResolver,
}

impl TranscriptionContext {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        provider: Arc<dyn TranscriptionProvider>,
        bucket: String,
        upload_prefix: String,
    ) -> Self {
        Self {
            relay: UploadRelay::new(store.clone(), provider.clone(), bucket, upload_prefix),
            resolver: JobResolver::new(store, provider),
        }
    }

    /// Build AWS clients from the configuration
    pub async fn from_config(config: &ServiceConfig) -> Self {
        let sdk_config = config.aws.load_sdk_config(config.request_timeout()).await;

        log::info!(
            "[Context] AWS clients ready: region='{}', bucket='{}'",
            config.aws.region,
            config.bucket
        );

        Self::new(
            Arc::new(S3ObjectStore::new(&sdk_config)),
            Arc::new(MedicalTranscribe::new(&sdk_config)),
            config.bucket.clone(),
            config.upload_prefix.clone(),
        )
    }
}

#[async_trait]
impl ServiceContext for TranscriptionContext {
    async fn upload(&self, audio: Bytes, filename: &str) -> Result<String, UploadError> {
        self.relay.submit(audio, filename).await
    }

    async fn status(&self, job_name: &str) -> Result<JobStatusView, ResolveError> {
        self.resolver.resolve(job_name).await
    }
}
