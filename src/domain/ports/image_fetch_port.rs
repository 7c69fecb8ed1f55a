//! Port definition for fetching remote images.

use std::sync::Arc;

/// Result type for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Errors that can occur while fetching an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport failure before a response arrived.
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Server answered with a non-success status.
    #[error("HTTP {status}: {reason}")]
    HttpStatus {
        /// Status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },
    /// Response body is not a decodable image.
    #[error("Decode error: {0}")]
    DecodeError(String),
}

/// Port for loading remote images.
/// Implementations must be thread-safe.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Fetches and decodes the image at `url`.
    ///
    /// Completes with either the decoded image or the failure the platform
    /// reported; the caller owns retry policy.
    async fn fetch(&self, url: &str) -> FetchResult<Arc<image::DynamicImage>>;
}
