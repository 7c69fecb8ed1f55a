//! Procedural renderer error types.

use thiserror::Error;

/// Procedural render failures. Always replaced by a plain gradient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum GeneratorError {
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("invalid gradient: {0}")]
    Gradient(String),

    #[error("invalid path for {0}")]
    Path(&'static str),
}
