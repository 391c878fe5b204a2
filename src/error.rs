use std::io;

use thiserror::Error;

/// Result alias used throughout the extraction pipeline.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors raised while turning a roster document into student records.
///
/// Only [`ExtractError::DocumentParse`] ends a run. Page, image and record
/// level variants are logged and skipped by the session.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document could not be parsed: {0}")]
    DocumentParse(String),
    #[error("page {page} could not be read: {reason}")]
    Page { page: usize, reason: String },
    #[error("image {handle} on page {page} could not be resolved: {reason}")]
    ImageResolution {
        page: usize,
        handle: String,
        reason: String,
    },
    #[error("image could not be decoded: {0}")]
    ImageDecode(String),
    #[error("JPEG encoding failed: {0}")]
    Encode(String),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// Whether the error should abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractError::DocumentParse(_))
    }
}
