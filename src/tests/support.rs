//! In-memory stand-ins for S3 and Transcribe Medical.
//!
//! They behave like the real services closely enough to exercise the relay
//! and resolver end to end: a created job starts IN_PROGRESS and only moves
//! when a test completes or fails it.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::storage::{ObjectStore, StorageError};
use crate::transcription::{
    JobReport, JobRequest, JobStatus, ProviderError, TranscriptionProvider,
};

pub const TEST_BUCKET: &str = "clinic-audio";

/// In-memory object store that counts every call
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Bytes>>,
    calls: AtomicUsize,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self) -> Vec<(String, String)> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.insert(bucket, key, body);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.object(bucket, key).ok_or_else(|| StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

/// Transcription provider that keeps jobs in a map
#[derive(Default)]
pub struct FakeTranscriptionProvider {
    jobs: Mutex<HashMap<String, JobReport>>,
    requests: Mutex<Vec<JobRequest>>,
    calls: AtomicUsize,
}

impl FakeTranscriptionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<JobRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_job(&self, job_name: &str, report: JobReport) {
        self.jobs
            .lock()
            .unwrap()
            .insert(job_name.to_string(), report);
    }

    pub fn complete_job(&self, job_name: &str, result_uri: &str) {
        self.set_job(
            job_name,
            JobReport {
                status: JobStatus::Completed,
                result_uri: Some(result_uri.to_string()),
                failure_reason: None,
            },
        );
    }

    pub fn fail_job(&self, job_name: &str, reason: Option<&str>) {
        self.set_job(
            job_name,
            JobReport {
                status: JobStatus::Failed,
                result_uri: None,
                failure_reason: reason.map(str::to_string),
            },
        );
    }
}

#[async_trait]
impl TranscriptionProvider for FakeTranscriptionProvider {
    async fn create_job(&self, request: &JobRequest) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.set_job(
            &request.job_name,
            JobReport {
                status: JobStatus::InProgress,
                result_uri: None,
                failure_reason: None,
            },
        );
        Ok(())
    }

    async fn job_status(&self, job_name: &str) -> Result<JobReport, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.jobs
            .lock()
            .unwrap()
            .get(job_name)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(job_name.to_string()))
    }
}

/// Store and provider shared with the code under test
pub fn fakes() -> (Arc<InMemoryObjectStore>, Arc<FakeTranscriptionProvider>) {
    (
        Arc::new(InMemoryObjectStore::new()),
        Arc::new(FakeTranscriptionProvider::new()),
    )
}

/// Result URI in the form Transcribe Medical hands out
pub fn result_uri(key: &str) -> String {
    format!("https://s3.us-east-1.amazonaws.com/{}/{}", TEST_BUCKET, key)
}
