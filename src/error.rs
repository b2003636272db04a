//! Conversion errors. Each variant is terminal for one conversion and renders
//! as the line shown to the user.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid image data: input is not a JPEG")]
    InvalidImageData,

    #[error("no XMP metadata found in image")]
    NoMetadata,

    #[error("no embedded right-eye image found in XMP metadata")]
    NoSecondaryPayload,

    #[error("failed to decode base64 right-eye payload: {0}")]
    Base64DecodingFailed(#[source] base64::DecodeError),

    #[error("failed to decode primary (left-eye) image: {0}")]
    PrimaryImageDecodeFailed(#[source] image::ImageError),

    #[error("failed to decode embedded (right-eye) image: {0}")]
    SecondaryImageDecodeFailed(#[source] image::ImageError),

    #[error("failed to create side-by-side image: {0}")]
    CompositeCreationFailed(String),

    #[error("failed to save output: {0}")]
    SaveFailed(String),
}

impl ConvertError {
    /// Stable short identifier (used in JSON output).
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::FileNotFound(_) => "file-not-found",
            ConvertError::ReadFailed { .. } => "read-failed",
            ConvertError::InvalidImageData => "invalid-image-data",
            ConvertError::NoMetadata => "no-metadata",
            ConvertError::NoSecondaryPayload => "no-secondary-payload",
            ConvertError::Base64DecodingFailed(_) => "base64-decoding-failed",
            ConvertError::PrimaryImageDecodeFailed(_) => "primary-image-decode-failed",
            ConvertError::SecondaryImageDecodeFailed(_) => "secondary-image-decode-failed",
            ConvertError::CompositeCreationFailed(_) => "composite-creation-failed",
            ConvertError::SaveFailed(_) => "save-failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
