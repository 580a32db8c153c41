//! Errors raised by capture backends and the factory.

use thiserror::Error;
use viewcap_data::DataError;

/// Errors that can occur while building or reading a capture backend.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Frame set has no {0} frame")]
    MissingStream(&'static str),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CaptureError {
    /// True for malformed crop or intrinsics parameters.
    pub fn is_validation(&self) -> bool {
        matches!(self, CaptureError::Data(err) if err.is_validation())
    }

    /// True when a configuration source does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CaptureError::Data(err) if err.is_not_found())
    }
}
