//! Job resolver: translate provider job state into a caller-facing view
//!
//! Only reads. Transitions happen inside the provider; the caller polls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::error::{ProviderError, ResolveError, TranscriptStructureError};
use super::provider::{JobReport, JobStatus, TranscriptionProvider};
use crate::storage::ObjectStore;

pub const UNKNOWN_FAILURE_REASON: &str = "Unknown reason";
pub const EMPTY_TRANSCRIPT_TEXT: &str = "No transcript text available.";
pub const TRANSCRIPT_STRUCTURE_ERROR: &str = "Transcript structure error";

/// What a status poll returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JobStatusView {
    pub fn pending(status: JobStatus) -> Self {
        Self {
            status,
            transcript_text: None,
            error: None,
            details: None,
        }
    }

    pub fn failed(status: JobStatus, reason: String) -> Self {
        Self {
            error: Some(reason),
            ..Self::pending(status)
        }
    }

    pub fn completed(status: JobStatus, transcript_text: String) -> Self {
        Self {
            transcript_text: Some(transcript_text),
            ..Self::pending(status)
        }
    }

    pub fn degraded(status: JobStatus, err: &TranscriptStructureError) -> Self {
        Self {
            error: Some(TRANSCRIPT_STRUCTURE_ERROR.to_string()),
            details: Some(err.to_string()),
            ..Self::pending(status)
        }
    }
}

/// A fetched transcript document and the text extracted from it
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptResult {
    pub raw_document: Value,
    pub transcript_text: String,
}

/// Split a provider result URI into `(bucket, key)`.
///
/// The provider hands out `https://<host>/<bucket>/<key...>`: after the
/// scheme, segment 0 is the host, segment 1 the bucket and the rest the key.
pub fn parse_result_location(uri: &str) -> Result<(String, String), TranscriptStructureError> {
    let without_scheme = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let segments: Vec<&str> = without_scheme.split('/').collect();

    match segments.as_slice() {
        [_host, bucket, key @ ..] if !bucket.is_empty() && !key.is_empty() => {
            let key = key.join("/");
            if key.is_empty() {
                return Err(TranscriptStructureError::MalformedResultUri(uri.to_string()));
            }
            Ok((bucket.to_string(), key))
        }
        _ => Err(TranscriptStructureError::MalformedResultUri(uri.to_string())),
    }
}

/// Why a document could not be turned into transcript text
#[derive(Debug, PartialEq)]
pub enum ExtractError {
    /// No top-level `results`: not a medical transcript at all
    UnexpectedFormat,
    Structure(TranscriptStructureError),
}

/// Pull the transcript text out of a medical transcript document.
///
/// `results.transcripts[0].transcript` is the text. An empty or absent
/// `transcripts` list yields [`EMPTY_TRANSCRIPT_TEXT`].
pub fn extract_transcript_text(document: &Value) -> Result<String, ExtractError> {
    let results = document
        .get("results")
        .ok_or(ExtractError::UnexpectedFormat)?;

    let first = match results.get("transcripts") {
        None | Some(Value::Null) => None,
        Some(Value::Array(transcripts)) => transcripts.first(),
        Some(_) => {
            return Err(ExtractError::Structure(
                TranscriptStructureError::MissingField("results.transcripts"),
            ))
        }
    };

    match first {
        None => {
            log::warn!("[Job Resolver] Transcript document has no segments");
            Ok(EMPTY_TRANSCRIPT_TEXT.to_string())
        }
        Some(segment) => segment
            .get("transcript")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ExtractError::Structure(
                TranscriptStructureError::MissingField("transcript"),
            )),
    }
}

pub struct JobResolver {
    store: Arc<dyn ObjectStore>,
    provider: Arc<dyn TranscriptionProvider>,
}

impl JobResolver {
    pub fn new(store: Arc<dyn ObjectStore>, provider: Arc<dyn TranscriptionProvider>) -> Self {
        Self { store, provider }
    }

    /// Look up `job_name` and, once it has COMPLETED, its transcript
    pub async fn resolve(&self, job_name: &str) -> Result<JobStatusView, ResolveError> {
        let report = self
            .provider
            .job_status(job_name)
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(name) => {
                    log::warn!("[Job Resolver] Job '{}' not found", name);
                    ResolveError::JobNotFound(name)
                }
                other => {
                    log::error!("[Job Resolver] Status lookup FAILED for '{}': {}", job_name, other);
                    ResolveError::Resolution {
                        cause: other.to_string(),
                    }
                }
            })?;

        log::debug!("[Job Resolver] Job status for '{}': {}", job_name, report.status);

        match report.status {
            JobStatus::Completed => self.resolve_completed(job_name, report).await,
            JobStatus::Failed => {
                let reason = report
                    .failure_reason
                    .unwrap_or_else(|| UNKNOWN_FAILURE_REASON.to_string());
                log::info!("[Job Resolver] Job '{}' FAILED: {}", job_name, reason);
                Ok(JobStatusView::failed(report.status, reason))
            }
            status => Ok(JobStatusView::pending(status)),
        }
    }

    async fn resolve_completed(
        &self,
        job_name: &str,
        report: JobReport,
    ) -> Result<JobStatusView, ResolveError> {
        let status = report.status;

        let uri = match report.result_uri {
            Some(uri) => uri,
            None => {
                let err = TranscriptStructureError::MissingResultUri;
                log::error!("[Job Resolver] Completed job '{}': {}", job_name, err);
                return Ok(JobStatusView::degraded(status, &err));
            }
        };

        match self.fetch_transcript(&uri).await? {
            Ok(result) => {
                if let Some(document_job) = result.raw_document.get("jobName").and_then(Value::as_str) {
                    if document_job != job_name {
                        log::warn!(
                            "[Job Resolver] Transcript for '{}' names job '{}'",
                            job_name,
                            document_job
                        );
                    }
                }
                log::info!(
                    "[Job Resolver] Transcript COMPLETED for '{}': {} chars",
                    job_name,
                    result.transcript_text.len()
                );
                Ok(JobStatusView::completed(status, result.transcript_text))
            }
            Err(err) => {
                log::error!("[Job Resolver] Completed job '{}': {}", job_name, err);
                Ok(JobStatusView::degraded(status, &err))
            }
        }
    }

    /// Outer error: the lookup itself failed. Inner error: the document was
    /// fetched but is missing fields, which the caller reports alongside the
    /// COMPLETED status.
    async fn fetch_transcript(
        &self,
        uri: &str,
    ) -> Result<Result<TranscriptResult, TranscriptStructureError>, ResolveError> {
        let (bucket, key) = match parse_result_location(uri) {
            Ok(location) => location,
            Err(e) => return Ok(Err(e)),
        };

        log::debug!(
            "[Job Resolver] Fetching transcript from bucket '{}', key '{}'",
            bucket,
            key
        );

        let body = self.store.get(&bucket, &key).await.map_err(|e| {
            log::error!("[Job Resolver] Transcript fetch FAILED: {}", e);
            ResolveError::from(e)
        })?;

        let document: Value = match serde_json::from_slice(&body) {
            Ok(doc) => doc,
            Err(e) => return Ok(Err(TranscriptStructureError::InvalidJson(e.to_string()))),
        };

        match extract_transcript_text(&document) {
            Ok(transcript_text) => Ok(Ok(TranscriptResult {
                raw_document: document,
                transcript_text,
            })),
            Err(ExtractError::Structure(e)) => Ok(Err(e)),
            Err(ExtractError::UnexpectedFormat) => {
                log::error!("[Job Resolver] Unexpected transcript format at {}", uri);
                Err(ResolveError::UnexpectedTranscriptFormat)
            }
        }
    }
}
