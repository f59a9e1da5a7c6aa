//! Image CDN errors.

use thiserror::Error;

/// Errors from the image CDN.
#[derive(Debug, Error)]
pub enum CdnError {
    /// The request was rejected before it was sent.
    #[error("Invalid upload request: {0}")]
    Validation(String),

    /// HTTP request failed.
    #[error("CDN request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("CDN response error: {0}")]
    Response(String),

    /// The CDN rejected the upload.
    #[error("CDN error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

impl CdnError {
    /// True when the caller sent something invalid.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
