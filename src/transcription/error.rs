//! Error types for the upload relay and job resolver

use crate::storage::StorageError;

/// Failure while accepting an upload and starting a transcription job
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Extension is not one of mp3, wav, flac, ogg. Raised before any network call.
    #[error("Invalid file type")]
    InvalidFileType,
    /// Staging or job submission failed
    #[error("{cause}")]
    Failed { cause: String },
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        UploadError::Failed {
            cause: err.to_string(),
        }
    }
}

impl From<ProviderError> for UploadError {
    fn from(err: ProviderError) -> Self {
        UploadError::Failed {
            cause: err.to_string(),
        }
    }
}

/// Failure while looking up a job and its transcript
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Transcription job '{0}' not found")]
    JobNotFound(String),
    /// Network, storage or provider failure. Not retried.
    #[error("{cause}")]
    Resolution { cause: String },
    /// Completed job whose result document has no `results` field
    #[error("Unexpected transcript format")]
    UnexpectedTranscriptFormat,
}

impl From<StorageError> for ResolveError {
    fn from(err: StorageError) -> Self {
        ResolveError::Resolution {
            cause: err.to_string(),
        }
    }
}

/// A completed job whose result could not be read into transcript text.
///
/// Non-fatal: the resolver still reports the COMPLETED status and puts
/// these details next to it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptStructureError {
    #[error("job has no transcript file URI")]
    MissingResultUri,
    #[error("transcript URI '{0}' does not name a bucket and key")]
    MalformedResultUri(String),
    #[error("transcript document is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("missing field '{0}'")]
    MissingField(&'static str),
}

/// Errors reported by a transcription provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("job '{0}' not found")]
    NotFound(String),
    #[error("{operation} failed: {cause}")]
    Service {
        operation: &'static str,
        cause: String,
    },
}
