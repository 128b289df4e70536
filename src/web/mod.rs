//! Web front-end module
//!
//! Serves the upload page and the `/upload` and `/status/{job_name}`
//! endpoints over the transcription core.

pub mod context;
pub mod http;
pub mod lifecycle;
pub mod server;
pub mod staging;
