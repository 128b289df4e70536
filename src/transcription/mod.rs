//! Job submission and result resolution
//!
//! [`UploadRelay`] turns an uploaded audio file into a running medical
//! transcription job; [`JobResolver`] turns a job name back into a status
//! and, once the job has completed, its transcript text.

pub mod error;
pub mod media;
pub mod medical;
pub mod provider;
pub mod relay;
pub mod resolver;

pub use error::{ProviderError, ResolveError, TranscriptStructureError, UploadError};
pub use media::MediaFormat;
pub use medical::MedicalTranscribe;
pub use provider::{JobReport, JobRequest, JobStatus, TranscriptionProvider};
pub use relay::UploadRelay;
pub use resolver::{JobResolver, JobStatusView};
