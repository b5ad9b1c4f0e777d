//! Custom error types for cartoonize.

use std::path::PathBuf;
use thiserror::Error;

use crate::notify::Notice;

/// Main error type for the cartoonize library.
#[derive(Error, Debug)]
pub enum Error {
    /// Convert or save was attempted while nothing is displayed.
    #[error("no image selected")]
    NoImageSelected,

    /// The picked resource could not be decoded into a pixel buffer.
    #[error("failed to decode image {source_name}: {source}")]
    DecodeFailure {
        source_name: String,
        #[source]
        source: image::ImageError,
    },

    /// The pictures directory is missing or not writable.
    #[error("storage is not available: {reason}")]
    StorageUnavailable { reason: String },

    /// Creating the directory, opening, encoding or writing the file failed.
    #[error("failed to save image to {path}: {reason}")]
    SaveFailed { path: PathBuf, reason: String },

    /// A model file is not on disk and no download source is configured.
    #[error("model file {path} not found")]
    ModelNotFound { path: PathBuf },

    /// Failed to download a model.
    #[error("failed to download model {name}: {source}")]
    ModelDownload {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {name}: {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: ort::Error,
    },

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// Failed to create the model directory.
    #[error("failed to create model directory {path}: {source}")]
    ModelDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

impl Error {
    /// The short user-facing notice this error is reported as.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::NoImageSelected => Notice::NoImageSelected,
            Self::StorageUnavailable { .. } => Notice::StorageUnavailable,
            Self::SaveFailed { .. } => Notice::SaveFailed,
            Self::DecodeFailure { .. } => Notice::DecodeFailed,
            _ => Notice::ConvertFailed,
        }
    }
}

/// Result type alias for cartoonize operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_mapping() {
        assert_eq!(Error::NoImageSelected.notice(), Notice::NoImageSelected);
        assert_eq!(
            Error::StorageUnavailable {
                reason: "unmounted".to_string()
            }
            .notice(),
            Notice::StorageUnavailable
        );
        assert_eq!(
            Error::SaveFailed {
                path: PathBuf::from("x.jpg"),
                reason: "disk full".to_string()
            }
            .notice(),
            Notice::SaveFailed
        );
        assert_eq!(
            Error::ShapeMismatch {
                expected: "4D tensor".to_string(),
                actual: "2D tensor".to_string()
            }
            .notice(),
            Notice::ConvertFailed
        );
    }
}
