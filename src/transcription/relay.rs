//! Upload relay: stage audio in object storage and start a transcription job

use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;

use super::error::UploadError;
use super::media::{secure_filename, MediaFormat};
use super::provider::{JobRequest, TranscriptionProvider};
use crate::storage::{object_uri, ObjectStore};

/// Prefix of every generated job name
pub const JOB_NAME_PREFIX: &str = "medical_transcription_";

/// One accepted upload, alive for the duration of a request
#[derive(Debug, Clone, PartialEq)]
pub struct UploadTask {
    pub source_filename: String,
    pub storage_key: String,
    pub media_format: MediaFormat,
}

impl UploadTask {
    /// Validate the filename and assign a collision-free storage key
    pub fn new(original_filename: &str, upload_prefix: &str) -> Result<Self, UploadError> {
        let media_format =
            MediaFormat::from_filename(original_filename).ok_or(UploadError::InvalidFileType)?;

        let storage_key = format!(
            "{}{}_{}",
            upload_prefix,
            Uuid::new_v4(),
            secure_filename(original_filename)
        );

        Ok(Self {
            source_filename: original_filename.to_string(),
            storage_key,
            media_format,
        })
    }
}

pub fn generate_job_name() -> String {
    format!("{}{}", JOB_NAME_PREFIX, Uuid::new_v4())
}

pub struct UploadRelay {
    store: Arc<dyn ObjectStore>,
    provider: Arc<dyn TranscriptionProvider>,
    bucket: String,
    upload_prefix: String,
}

impl UploadRelay {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        provider: Arc<dyn TranscriptionProvider>,
        bucket: String,
        upload_prefix: String,
    ) -> Self {
        Self {
            store,
            provider,
            bucket,
            upload_prefix,
        }
    }

    /// Store `audio` and start a medical transcription job for it.
    ///
    /// Returns the job name, the only handle the caller needs to poll the
    /// result. If the job cannot be started the stored object is removed
    /// again (best effort).
    pub async fn submit(&self, audio: Bytes, original_filename: &str) -> Result<String, UploadError> {
        let task = UploadTask::new(original_filename, &self.upload_prefix).map_err(|e| {
            log::warn!(
                "[Upload Relay] Upload REJECTED - unsupported file type: '{}'",
                original_filename
            );
            e
        })?;

        log::info!(
            "[Upload Relay] Staging '{}' ({:.1} KB, {}) at s3://{}/{}",
            task.source_filename,
            audio.len() as f64 / 1024.0,
            task.media_format,
            self.bucket,
            task.storage_key
        );

        self.store
            .put(&self.bucket, &task.storage_key, audio)
            .await
            .map_err(|e| {
                log::error!("[Upload Relay] Staging FAILED for '{}': {}", task.source_filename, e);
                UploadError::from(e)
            })?;

        let job_name = generate_job_name();
        let request = JobRequest::new(
            job_name.clone(),
            task.media_format,
            object_uri(&self.bucket, &task.storage_key),
            self.bucket.clone(),
        );

        if let Err(e) = self.provider.create_job(&request).await {
            log::error!("[Upload Relay] Job submission FAILED for '{}': {}", job_name, e);
            self.discard_staged(&task).await;
            return Err(e.into());
        }

        log::info!(
            "[Upload Relay] Transcription job STARTED: '{}' for '{}'",
            job_name,
            task.source_filename
        );

        Ok(job_name)
    }

    async fn discard_staged(&self, task: &UploadTask) {
        match self.store.delete(&self.bucket, &task.storage_key).await {
            Ok(()) => log::info!(
                "[Upload Relay] Removed staged object s3://{}/{}",
                self.bucket,
                task.storage_key
            ),
            Err(e) => log::warn!(
                "[Upload Relay] Cleanup FAILED for s3://{}/{}: {}",
                self.bucket,
                task.storage_key,
                e
            ),
        }
    }
}
