//! Result copier errors
//!
//! Every failure carries full detail for the server log through `Display`,
//! while `client_message` is the only text a caller ever sees.

use hyper::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

const GENERIC_PROCESSING_MESSAGE: &str =
    "An error occurred while processing the image. Please try again.";

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no image_name provided")]
    MissingName,

    #[error("rejected image name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("failed to load input image {}: {reason}", path.display())]
    LoadInput { path: PathBuf, reason: String },

    #[error("failed to load result image {index} at {}: {reason}", path.display())]
    LoadResult {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("processing failed: {0}")]
    Processing(String),
}

impl ProcessError {
    /// Error category used in server logs
    pub const fn category(&self) -> &'static str {
        match self {
            Self::MissingName | Self::InvalidName { .. } => "ValidationError",
            Self::LoadInput { .. } | Self::LoadResult { .. } => "LoadError",
            Self::Processing(_) => "ProcessingError",
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingName | Self::InvalidName { .. } => StatusCode::BAD_REQUEST,
            Self::LoadInput { .. } | Self::LoadResult { .. } | Self::Processing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            Self::MissingName => "Please select an image".to_string(),
            Self::InvalidName { .. } => "Invalid image name".to_string(),
            Self::LoadInput { .. } => "Failed to Load Image".to_string(),
            Self::LoadResult { index, .. } => format!("Failed to load result image {index}"),
            Self::Processing(_) => GENERIC_PROCESSING_MESSAGE.to_string(),
        }
    }
}
