//! Local staging for in-flight uploads
//!
//! The multipart file part is streamed to a temp file inside the staging
//! directory instead of being held in memory while it arrives. The file is
//! deleted when the [`StagedUpload`] drops, whichever way the request ends.

use bytes::{Buf, Bytes};
use futures_util::{pin_mut, Stream, TryStreamExt};
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("failed to receive upload: {0}")]
    Receive(String),
    #[error("staging I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct StagingArea {
    dir: PathBuf,
    max_bytes: u64,
}

impl StagingArea {
    /// Create the staging directory if needed
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, StagingError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Write a chunk stream to a fresh temp file, enforcing the size limit
    pub async fn stage<S, B, E>(&self, chunks: S) -> Result<StagedUpload, StagingError>
    where
        S: Stream<Item = Result<B, E>>,
        B: Buf,
        E: Display,
    {
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(&self.dir)?;
        let mut len: u64 = 0;

        pin_mut!(chunks);
        while let Some(mut chunk) = chunks
            .try_next()
            .await
            .map_err(|e| StagingError::Receive(e.to_string()))?
        {
            len += chunk.remaining() as u64;
            if len > self.max_bytes {
                return Err(StagingError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            while chunk.has_remaining() {
                let written = {
                    let slice = chunk.chunk();
                    file.write_all(slice)?;
                    slice.len()
                };
                chunk.advance(written);
            }
        }

        file.flush()?;
        log::debug!("[Staging] Received {} bytes into {:?}", len, file.path());

        Ok(StagedUpload { file, len })
    }
}

/// A received upload on local disk
pub struct StagedUpload {
    file: NamedTempFile,
    len: u64,
}

impl StagedUpload {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub async fn read(&self) -> Result<Bytes, StagingError> {
        Ok(Bytes::from(tokio::fs::read(self.file.path()).await?))
    }
}
