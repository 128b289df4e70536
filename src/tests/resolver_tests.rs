//! Tests for the job resolver
//!
//! Jobs are driven through the fake provider; transcript documents are put
//! in the fake store at the location the result URI names.

use serde_json::json;
use std::sync::Arc;

use super::support::{fakes, result_uri, FakeTranscriptionProvider, InMemoryObjectStore, TEST_BUCKET};
use crate::storage::{MockObjectStore, StorageError};
use crate::transcription::provider::MockTranscriptionProvider;
use crate::transcription::resolver::{
    EMPTY_TRANSCRIPT_TEXT, TRANSCRIPT_STRUCTURE_ERROR, UNKNOWN_FAILURE_REASON,
};
use crate::transcription::{
    JobReport, JobResolver, JobStatus, ProviderError, ResolveError, UploadRelay,
};

const JOB: &str = "medical_transcription_test";
const RESULT_KEY: &str = "medical/medical_transcription_test.json";

fn resolver(store: &Arc<InMemoryObjectStore>, provider: &Arc<FakeTranscriptionProvider>) -> JobResolver {
    JobResolver::new(store.clone(), provider.clone())
}

fn completed_with(document: serde_json::Value) -> JobResolver {
    let (store, provider) = fakes();
    store.insert(TEST_BUCKET, RESULT_KEY, serde_json::to_vec(&document).unwrap());
    provider.complete_job(JOB, &result_uri(RESULT_KEY));
    resolver(&store, &provider)
}

/// Unknown job names are reported as not found
#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let (store, provider) = fakes();
    let err = resolver(&store, &provider).resolve("nope").await.unwrap_err();
    assert!(matches!(err, ResolveError::JobNotFound(ref name) if name == "nope"));
}

/// Completed job with a transcript yields its text
#[tokio::test]
async fn test_completed_job_returns_transcript_text() {
    let resolver = completed_with(json!({
        "jobName": JOB,
        "results": {"transcripts": [{"transcript": "hello world"}]}
    }));

    let view = resolver.resolve(JOB).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.transcript_text.as_deref(), Some("hello world"));
    assert!(view.error.is_none());
}

/// A document naming another job still yields its text
#[tokio::test]
async fn test_document_job_name_mismatch_is_not_fatal() {
    let resolver = completed_with(json!({
        "jobName": "medical_transcription_other",
        "results": {"transcripts": [{"transcript": "follow up in two weeks"}]}
    }));

    let view = resolver.resolve(JOB).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.transcript_text.as_deref(), Some("follow up in two weeks"));
}

/// An empty transcript list is a success with placeholder text
#[tokio::test]
async fn test_completed_job_with_no_transcripts() {
    let resolver = completed_with(json!({"results": {"transcripts": []}}));

    let view = resolver.resolve(JOB).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.transcript_text.as_deref(), Some(EMPTY_TRANSCRIPT_TEXT));
    assert_eq!(view.transcript_text.as_deref(), Some("No transcript text available."));
    assert!(view.error.is_none());
}

/// A document without `results` is a hard error
#[tokio::test]
async fn test_completed_job_without_results_is_unexpected_format() {
    let resolver = completed_with(json!({"transcript": "hello world"}));

    let err = resolver.resolve(JOB).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnexpectedTranscriptFormat));
}

/// Failed job without a reason reports "Unknown reason"
#[tokio::test]
async fn test_failed_job_without_reason() {
    let (store, provider) = fakes();
    provider.fail_job(JOB, None);

    let view = resolver(&store, &provider).resolve(JOB).await.unwrap();
    assert_eq!(view.status, JobStatus::Failed);
    assert_eq!(view.error.as_deref(), Some(UNKNOWN_FAILURE_REASON));
    assert_eq!(view.error.as_deref(), Some("Unknown reason"));
    assert!(view.transcript_text.is_none());
}

/// Failed job passes the provider's reason through
#[tokio::test]
async fn test_failed_job_with_reason() {
    let (store, provider) = fakes();
    provider.fail_job(JOB, Some("The media format provided does not match the detected media format."));

    let view = resolver(&store, &provider).resolve(JOB).await.unwrap();
    assert_eq!(view.status, JobStatus::Failed);
    assert!(view.error.unwrap().contains("media format"));
}

/// Non-terminal states carry neither text nor error
#[tokio::test]
async fn test_non_terminal_states_pass_through() {
    let (store, provider) = fakes();
    let resolver = resolver(&store, &provider);

    for status in [
        JobStatus::Queued,
        JobStatus::InProgress,
        JobStatus::Other("PAUSED".to_string()),
    ] {
        provider.set_job(
            JOB,
            JobReport {
                status: status.clone(),
                result_uri: None,
                failure_reason: None,
            },
        );
        let view = resolver.resolve(JOB).await.unwrap();
        assert_eq!(view.status, status);
        assert!(view.transcript_text.is_none());
        assert!(view.error.is_none());
    }
    assert_eq!(store.calls(), 0);
}

/// Completed job without a result location degrades instead of failing
#[tokio::test]
async fn test_completed_job_without_result_uri_is_structure_error() {
    let (store, provider) = fakes();
    provider.set_job(
        JOB,
        JobReport {
            status: JobStatus::Completed,
            result_uri: None,
            failure_reason: None,
        },
    );

    let view = resolver(&store, &provider).resolve(JOB).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.error.as_deref(), Some(TRANSCRIPT_STRUCTURE_ERROR));
    assert!(view.details.unwrap().contains("transcript file URI"));
}

/// Malformed result URI and non-JSON bodies degrade too
#[tokio::test]
async fn test_unreadable_results_are_structure_errors() {
    let (store, provider) = fakes();
    provider.complete_job(JOB, "https://s3.us-east-1.amazonaws.com/only-bucket");
    let view = resolver(&store, &provider).resolve(JOB).await.unwrap();
    assert_eq!(view.error.as_deref(), Some(TRANSCRIPT_STRUCTURE_ERROR));

    store.insert(TEST_BUCKET, RESULT_KEY, "not json");
    provider.complete_job(JOB, &result_uri(RESULT_KEY));
    let view = resolver(&store, &provider).resolve(JOB).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.error.as_deref(), Some(TRANSCRIPT_STRUCTURE_ERROR));
    assert!(view.details.unwrap().contains("not valid JSON"));

    store.insert(TEST_BUCKET, RESULT_KEY, r#"{"results":{"transcripts":[{}]}}"#);
    let view = resolver(&store, &provider).resolve(JOB).await.unwrap();
    assert_eq!(view.error.as_deref(), Some(TRANSCRIPT_STRUCTURE_ERROR));
    assert!(view.details.unwrap().contains("transcript"));
}

/// The result object is fetched from the bucket and key named in the URI
#[tokio::test]
async fn test_result_fetched_from_uri_location() {
    let mut store = MockObjectStore::new();
    store
        .expect_get()
        .withf(|bucket, key| bucket == "output-bucket" && key == "nested/dir/job.json")
        .times(1)
        .returning(|_, _| {
            Ok(bytes::Bytes::from_static(
                br#"{"results":{"transcripts":[{"transcript":"from mock"}]}}"#,
            ))
        });

    let mut provider = MockTranscriptionProvider::new();
    provider.expect_job_status().returning(|_| {
        Ok(JobReport {
            status: JobStatus::Completed,
            result_uri: Some(
                "https://s3.eu-west-1.amazonaws.com/output-bucket/nested/dir/job.json".to_string(),
            ),
            failure_reason: None,
        })
    });

    let resolver = JobResolver::new(Arc::new(store), Arc::new(provider));
    let view = resolver.resolve(JOB).await.unwrap();
    assert_eq!(view.transcript_text.as_deref(), Some("from mock"));
}

/// Storage errors while fetching surface as resolution errors
#[tokio::test]
async fn test_fetch_failure_is_resolution_error() {
    let (store, provider) = fakes();
    provider.complete_job(JOB, &result_uri("missing.json"));

    let err = resolver(&store, &provider).resolve(JOB).await.unwrap_err();
    match err {
        ResolveError::Resolution { cause } => assert!(cause.contains("missing.json")),
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Provider errors other than not-found surface with their cause
#[tokio::test]
async fn test_provider_failure_is_resolution_error() {
    let store = MockObjectStore::new();
    let mut provider = MockTranscriptionProvider::new();
    provider.expect_job_status().returning(|_| {
        Err(ProviderError::Service {
            operation: "GetMedicalTranscriptionJob",
            cause: "ThrottlingException".to_string(),
        })
    });

    let resolver = JobResolver::new(Arc::new(store), Arc::new(provider));
    let err = resolver.resolve(JOB).await.unwrap_err();
    assert!(matches!(err, ResolveError::Resolution { ref cause } if cause.contains("ThrottlingException")));
}

/// Storage errors keep their operation in the message
#[tokio::test]
async fn test_storage_error_cause_preserved() {
    let mut store = MockObjectStore::new();
    store.expect_get().returning(|bucket, key| {
        Err(StorageError::Request {
            operation: "GetObject",
            bucket: bucket.to_string(),
            key: key.to_string(),
            cause: "dispatch failure".to_string(),
        })
    });
    let mut provider = MockTranscriptionProvider::new();
    provider.expect_job_status().returning(|_| {
        Ok(JobReport {
            status: JobStatus::Completed,
            result_uri: Some(result_uri(RESULT_KEY)),
            failure_reason: None,
        })
    });

    let resolver = JobResolver::new(Arc::new(store), Arc::new(provider));
    let err = resolver.resolve(JOB).await.unwrap_err();
    assert!(err.to_string().contains("GetObject"));
    assert!(err.to_string().contains("dispatch failure"));
}

/// Submitting and immediately resolving yields a non-terminal status
#[tokio::test]
async fn test_submit_then_resolve_is_not_terminal() {
    let (store, provider) = fakes();
    let relay = UploadRelay::new(
        store.clone(),
        provider.clone(),
        TEST_BUCKET.to_string(),
        "uploads/".to_string(),
    );
    let resolver = resolver(&store, &provider);

    let job_name = relay
        .submit(bytes::Bytes::from_static(b"ID3audio"), "visit.mp3")
        .await
        .unwrap();
    let view = resolver.resolve(&job_name).await.unwrap();

    assert!(!view.status.is_terminal());
    assert!(view.transcript_text.is_none());
    assert!(view.error.is_none());
}

/// Full cycle: submit, provider completes, transcript read back
#[tokio::test]
async fn test_submit_complete_resolve_cycle() {
    let (store, provider) = fakes();
    let relay = UploadRelay::new(
        store.clone(),
        provider.clone(),
        TEST_BUCKET.to_string(),
        "uploads/".to_string(),
    );
    let resolver = resolver(&store, &provider);

    let job_name = relay
        .submit(bytes::Bytes::from_static(b"fLaC"), "visit.flac")
        .await
        .unwrap();

    let output_key = format!("medical/{}.json", job_name);
    store.insert(
        TEST_BUCKET,
        &output_key,
        serde_json::to_vec(&json!({
            "jobName": job_name,
            "results": {"transcripts": [{"transcript": "Patient reports mild headache."}]}
        }))
        .unwrap(),
    );
    provider.complete_job(&job_name, &result_uri(&output_key));

    let view = resolver.resolve(&job_name).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(
        view.transcript_text.as_deref(),
        Some("Patient reports mild headache.")
    );
}
