//! Image generation errors.

use thiserror::Error;

/// Errors from the image generation service.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The request was rejected before it was sent.
    #[error("Invalid generation request: {0}")]
    Validation(String),

    /// Signing the API token failed.
    #[error("Token signing failed: {0}")]
    Token(String),

    /// HTTP request failed.
    #[error("Image API request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Image API response error: {0}")]
    Response(String),

    /// The API answered with a non-zero result code.
    #[error("Image API error {code}: {message}")]
    Api { code: i64, message: String },
}

impl MediaError {
    /// True when the caller sent something invalid.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
