//! Image pipeline error types.

use thiserror::Error;

/// Ways an artwork image can fail to reach the page.
///
/// None of these escape the resolver: they are logged and handed to the
/// embedding page's `on_error` notification, and the page gets a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ImageError {
    #[error("no image source supplied")]
    NoSource,

    #[error("failed to load {url}: {message}")]
    LoadFailed { url: String, message: String },

    #[error("gave up on {url} after {retries} retries: {message}")]
    RetryExhausted {
        url: String,
        retries: u32,
        message: String,
    },
}

impl ImageError {
    /// Creates load failed error.
    #[must_use]
    pub fn load_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates retry exhausted error.
    #[must_use]
    pub fn retry_exhausted(url: impl Into<String>, retries: u32, message: impl Into<String>) -> Self {
        Self::RetryExhausted {
            url: url.into(),
            retries,
            message: message.into(),
        }
    }

    /// Returns whether the loader recovers from this error on its own.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::LoadFailed { .. })
    }

    /// Returns whether the procedural fallback should be shown.
    #[must_use]
    pub const fn shows_fallback(&self) -> bool {
        matches!(self, Self::NoSource | Self::RetryExhausted { .. })
    }
}
