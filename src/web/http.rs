//! HTTP routes for the transcription front-end
//!
//! Uses warp to serve the upload page, accept audio uploads and report job
//! status.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{pin_mut, TryStreamExt};
use log::{info, warn};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use super::server::{ErrorResponse, UploadResponse};
use super::staging::{StagedUpload, StagingArea, StagingError};
use crate::transcription::{JobStatusView, MediaFormat, ResolveError, UploadError};

/// Multipart field carrying the audio file
const FILE_FIELD: &str = "file";

/// Room for boundaries and part headers on top of the file size limit.
/// The file itself is held to the exact limit by the staging area.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Trait for the service behind the routes (allows mocking in tests)
#[async_trait]
pub trait ServiceContext: Send + Sync {
    async fn upload(&self, audio: Bytes, filename: &str) -> Result<String, UploadError>;
    async fn status(&self, job_name: &str) -> Result<JobStatusView, ResolveError>;
}

/// Create all warp routes for the front-end
pub fn create_routes<T: ServiceContext + 'static>(
    ctx: Arc<T>,
    staging: Arc<StagingArea>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    index_page()
        .or(upload_endpoint(ctx.clone(), staging))
        .or(status_endpoint(ctx))
        .recover(handle_rejection)
}

/// GET / - Upload page with client-side status polling
fn index_page() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML))
}

/// POST /upload - Accepts a multipart audio file and starts a transcription job
fn upload_endpoint<T: ServiceContext + 'static>(
    ctx: Arc<T>,
    staging: Arc<StagingArea>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let max_length = staging.max_bytes().saturating_add(MULTIPART_OVERHEAD);
    warp::path!("upload")
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_length))
        .and(with_context(ctx))
        .and(warp::any().map(move || staging.clone()))
        .and_then(handle_upload)
}

/// GET /status/{job_name} - Reports job status and, once completed, the transcript
fn status_endpoint<T: ServiceContext + 'static>(
    ctx: Arc<T>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("status" / String)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(handle_status)
}

/// Helper to inject context into handlers
fn with_context<T: ServiceContext + 'static>(
    ctx: Arc<T>,
) -> impl Filter<Extract = (Arc<T>,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

fn json_reply<B: Serialize>(body: &B, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn error_reply(error: impl Into<String>, status: StatusCode) -> WithStatus<Json> {
    json_reply(&ErrorResponse::new(error), status)
}

/// Pull the `file` part out of the form and stage it on disk.
///
/// Returns the client filename with the staged bytes, or the reply to send
/// when the form does not carry a usable file.
async fn receive_file(
    form: FormData,
    staging: &StagingArea,
) -> Result<(String, StagedUpload), WithStatus<Json>> {
    pin_mut!(form);

    loop {
        let part = match form.try_next().await {
            Ok(Some(part)) => part,
            Ok(None) => {
                warn!("[HTTP] Upload REJECTED - no file part");
                return Err(error_reply("No file provided", StatusCode::BAD_REQUEST));
            }
            Err(e) => {
                warn!("[HTTP] Upload REJECTED - malformed multipart body: {}", e);
                return Err(error_reply(
                    format!("Malformed upload: {}", e),
                    StatusCode::BAD_REQUEST,
                ));
            }
        };

        if part.name() != FILE_FIELD {
            continue;
        }

        let filename = part.filename().unwrap_or_default().to_string();
        if filename.is_empty() {
            warn!("[HTTP] Upload REJECTED - empty filename");
            return Err(error_reply("No file selected", StatusCode::BAD_REQUEST));
        }

        if MediaFormat::from_filename(&filename).is_none() {
            warn!("[HTTP] Upload REJECTED - unsupported file type: '{}'", filename);
            return Err(error_reply(
                UploadError::InvalidFileType.to_string(),
                StatusCode::BAD_REQUEST,
            ));
        }

        return match staging.stage(part.stream()).await {
            Ok(staged) => Ok((filename, staged)),
            Err(e @ StagingError::TooLarge { .. }) => {
                warn!("[HTTP] Upload REJECTED - '{}': {}", filename, e);
                Err(error_reply(e.to_string(), StatusCode::PAYLOAD_TOO_LARGE))
            }
            Err(e @ StagingError::Receive(_)) => {
                warn!("[HTTP] Upload REJECTED - '{}': {}", filename, e);
                Err(error_reply(e.to_string(), StatusCode::BAD_REQUEST))
            }
            Err(e) => {
                warn!("[HTTP] Upload staging FAILED for '{}': {}", filename, e);
                Err(error_reply(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR))
            }
        };
    }
}

/// Handle POST /upload
async fn handle_upload<T: ServiceContext + 'static>(
    form: FormData,
    ctx: Arc<T>,
    staging: Arc<StagingArea>,
) -> Result<impl Reply, Rejection> {
    let (filename, staged) = match receive_file(form, &staging).await {
        Ok(received) => received,
        Err(reply) => return Ok(reply),
    };

    if staged.is_empty() {
        warn!("[HTTP] Upload '{}' has no content", filename);
    } else {
        info!(
            "[HTTP] Upload received: '{}', {:.1} KB",
            filename,
            staged.len() as f64 / 1024.0
        );
    }

    let audio = match staged.read().await {
        Ok(audio) => audio,
        Err(e) => {
            warn!("[HTTP] Upload FAILED reading staged file for '{}': {}", filename, e);
            return Ok(error_reply(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR));
        }
    };

    let result = ctx.upload(audio, &filename).await;
    drop(staged);

    match result {
        Ok(job_name) => {
            info!("[HTTP] Upload COMPLETED: '{}' -> job '{}'", filename, job_name);
            Ok(json_reply(&UploadResponse::new(job_name), StatusCode::OK))
        }
        Err(e @ UploadError::InvalidFileType) => {
            Ok(error_reply(e.to_string(), StatusCode::BAD_REQUEST))
        }
        Err(e) => {
            warn!("[HTTP] Upload FAILED for '{}': {}", filename, e);
            Ok(error_reply(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// Handle GET /status/{job_name}
async fn handle_status<T: ServiceContext + 'static>(
    job_name: String,
    ctx: Arc<T>,
) -> Result<impl Reply, Rejection> {
    match ctx.status(&job_name).await {
        Ok(view) => {
            info!("[HTTP] Status for '{}': {}", job_name, view.status);
            Ok(json_reply(&view, StatusCode::OK))
        }
        Err(e @ ResolveError::JobNotFound(_)) => {
            info!("[HTTP] Status REJECTED - {}", e);
            Ok(error_reply(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR))
        }
        Err(e) => {
            warn!("[HTTP] Status check FAILED for '{}': {}", job_name, e);
            Ok(error_reply(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// Turn warp rejections into JSON errors
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (message, status) = if err.is_not_found() {
        ("Not found".to_string(), StatusCode::NOT_FOUND)
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        ("Upload too large".to_string(), StatusCode::PAYLOAD_TOO_LARGE)
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ("Method not allowed".to_string(), StatusCode::METHOD_NOT_ALLOWED)
    } else {
        warn!("[HTTP] Request REJECTED: {:?}", err);
        ("Invalid request".to_string(), StatusCode::BAD_REQUEST)
    };

    Ok(error_reply(message, status))
}
