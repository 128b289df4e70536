//! Wire types for the web front-end

use serde::{Deserialize, Serialize};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

/// Response from POST /upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub message: String,
    pub job_name: String,
}

impl UploadResponse {
    pub fn new(job_name: String) -> Self {
        Self {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            job_name,
        }
    }
}

/// Error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
