//! Video payload handed to `POST /upload`.
//!
//! An [`Upload`] owns its bytes and is consumed by the submit call, so a
//! payload is sent at most once. Retrying a submit means building a new
//! `Upload` on purpose; the gateway does not deduplicate.

use std::path::Path;

use vidconv_core::error::CoreError;
use vidconv_core::media::video_content_type;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

pub struct Upload {
    file_name: String,
    content_type: &'static str,
    bytes: Vec<u8>,
}

impl Upload {
    /// Build an upload from in-memory bytes.
    ///
    /// Rejects empty payloads and file names whose extension the converter
    /// does not accept.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let file_name = file_name.into();
        let content_type = video_content_type(&file_name)?;
        if bytes.is_empty() {
            return Err(CoreError::Validation(format!("{file_name} is empty")).into());
        }
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Read a video file fully into memory. The display name is the file's
    /// final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::Validation(format!("{} has no file name", path.display())))?
            .to_string();

        // Validate before touching the disk.
        video_content_type(&file_name)?;

        let bytes = tokio::fs::read(path).await.map_err(|source| UploadError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_bytes(file_name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Consume the upload, yielding its parts.
    pub fn into_parts(self) -> (String, &'static str, Vec<u8>) {
        (self.file_name, self.content_type, self.bytes)
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
