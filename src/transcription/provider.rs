//! Transcription provider seam
//!
//! The job lifecycle belongs to the provider. This crate submits jobs and
//! reads their status, nothing more.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ProviderError;
use super::media::MediaFormat;

pub const LANGUAGE_CODE: &str = "en-US";
pub const SPECIALTY: &str = "PRIMARYCARE";
pub const CONVERSATION_TYPE: &str = "CONVERSATION";

/// Request to start a medical transcription job
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub job_name: String,
    pub language_code: &'static str,
    pub media_format: MediaFormat,
    /// `s3://bucket/key` of the staged audio
    pub media_uri: String,
    pub output_bucket: String,
    pub specialty: &'static str,
    pub conversation_type: &'static str,
}

impl JobRequest {
    /// Build a request with the fixed language, specialty and conversation type
    pub fn new(
        job_name: String,
        media_format: MediaFormat,
        media_uri: String,
        output_bucket: String,
    ) -> Self {
        Self {
            job_name,
            language_code: LANGUAGE_CODE,
            media_format,
            media_uri,
            output_bucket,
            specialty: SPECIALTY,
            conversation_type: CONVERSATION_TYPE,
        }
    }
}

/// Job state as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    /// Any state this crate has no special handling for
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Other(s) => s,
        }
    }

    /// COMPLETED and FAILED never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "QUEUED" => JobStatus::Queued,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            other => JobStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        JobStatus::from(s.as_str())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a job returned by a status lookup
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub status: JobStatus,
    /// Where the transcript document lives once the job is COMPLETED
    pub result_uri: Option<String>,
    pub failure_reason: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn create_job(&self, request: &JobRequest) -> Result<(), ProviderError>;

    /// Fails with [`ProviderError::NotFound`] when the provider has no such job
    async fn job_status(&self, job_name: &str) -> Result<JobReport, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_request_fixed_fields() {
        let request = JobRequest::new(
            "medical_transcription_1".to_string(),
            MediaFormat::Wav,
            "s3://bucket/uploads/a.wav".to_string(),
            "bucket".to_string(),
        );
        assert_eq!(request.language_code, "en-US");
        assert_eq!(request.specialty, "PRIMARYCARE");
        assert_eq!(request.conversation_type, "CONVERSATION");
    }

    #[test]
    fn test_status_round_trips_through_provider_strings() {
        for raw in ["QUEUED", "IN_PROGRESS", "COMPLETED", "FAILED", "PAUSED"] {
            assert_eq!(JobStatus::from(raw).as_str(), raw);
        }
        assert_eq!(JobStatus::from("PAUSED"), JobStatus::Other("PAUSED".to_string()));
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(!JobStatus::Other("PAUSED".to_string()).is_terminal());
    }

    #[test]
    fn test_status_serializes_as_provider_string() {
        let json = serde_json::to_string(&JobStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
