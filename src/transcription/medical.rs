//! AWS Transcribe Medical implementation of [`TranscriptionProvider`]
//!
//! Uses StartMedicalTranscriptionJob / GetMedicalTranscriptionJob. Output
//! lands in the configured bucket; the job's `TranscriptFileUri` points at it
//! in `https://s3.<region>.amazonaws.com/<bucket>/<key>` form.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_transcribe::error::DisplayErrorContext;
use aws_sdk_transcribe::operation::get_medical_transcription_job::GetMedicalTranscriptionJobError;
use aws_sdk_transcribe::types::{
    LanguageCode, Media, MediaFormat as AwsMediaFormat, Specialty, Type,
};
use aws_sdk_transcribe::Client;

use super::error::ProviderError;
use super::media::MediaFormat;
use super::provider::{JobReport, JobRequest, JobStatus, TranscriptionProvider};

/// Transcribe answers lookups of unknown jobs with a BadRequestException
/// carrying this text rather than a NotFoundException.
const JOB_NOT_FOUND_MESSAGE: &str = "couldn't be found";

pub struct MedicalTranscribe {
    client: Client,
}

impl MedicalTranscribe {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

fn aws_media_format(format: MediaFormat) -> AwsMediaFormat {
    match format {
        MediaFormat::Mp3 => AwsMediaFormat::Mp3,
        MediaFormat::Wav => AwsMediaFormat::Wav,
        MediaFormat::Flac => AwsMediaFormat::Flac,
        MediaFormat::Ogg => AwsMediaFormat::Ogg,
    }
}

fn service_error<E>(operation: &'static str, err: E) -> ProviderError
where
    E: std::error::Error + 'static,
{
    ProviderError::Service {
        operation,
        cause: DisplayErrorContext(&err).to_string(),
    }
}

fn is_job_not_found(err: &GetMedicalTranscriptionJobError) -> bool {
    match err {
        GetMedicalTranscriptionJobError::NotFoundException(_) => true,
        GetMedicalTranscriptionJobError::BadRequestException(e) => e
            .message()
            .map(|m| m.contains(JOB_NOT_FOUND_MESSAGE))
            .unwrap_or(false),
        _ => false,
    }
}

#[async_trait]
impl TranscriptionProvider for MedicalTranscribe {
    async fn create_job(&self, request: &JobRequest) -> Result<(), ProviderError> {
        self.client
            .start_medical_transcription_job()
            .medical_transcription_job_name(&request.job_name)
            .language_code(LanguageCode::from(request.language_code))
            .media_format(aws_media_format(request.media_format))
            .media(Media::builder().media_file_uri(&request.media_uri).build())
            .output_bucket_name(&request.output_bucket)
            .specialty(Specialty::from(request.specialty))
            .r#type(Type::from(request.conversation_type))
            .send()
            .await
            .map_err(|e| service_error("StartMedicalTranscriptionJob", e))?;

        log::debug!(
            "[Transcribe] Job '{}' submitted for {}",
            request.job_name,
            request.media_uri
        );
        Ok(())
    }

    async fn job_status(&self, job_name: &str) -> Result<JobReport, ProviderError> {
        let output = self
            .client
            .get_medical_transcription_job()
            .medical_transcription_job_name(job_name)
            .send()
            .await
            .map_err(|e| {
                let not_found = e.as_service_error().map(is_job_not_found).unwrap_or(false);
                if not_found {
                    ProviderError::NotFound(job_name.to_string())
                } else {
                    service_error("GetMedicalTranscriptionJob", e)
                }
            })?;

        let job = output
            .medical_transcription_job()
            .ok_or_else(|| ProviderError::NotFound(job_name.to_string()))?;

        let status = job
            .transcription_job_status()
            .map(|s| JobStatus::from(s.as_str()))
            .unwrap_or_else(|| JobStatus::Other("UNKNOWN".to_string()));

        Ok(JobReport {
            status,
            result_uri: job
                .transcript()
                .and_then(|t| t.transcript_file_uri())
                .map(str::to_string),
            failure_reason: job.failure_reason().map(str::to_string),
        })
    }
}
