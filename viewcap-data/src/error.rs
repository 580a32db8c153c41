//! Error type for frame and intrinsics operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the data utilities.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl DataError {
    /// True for malformed crop or intrinsics parameters.
    pub fn is_validation(&self) -> bool {
        matches!(self, DataError::Validation(_))
    }

    /// True when a configuration or image source does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }
}
