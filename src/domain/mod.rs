//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Query-string rules for sized and cache-busted image URLs.
pub mod url_params;

pub use entities::{ArtworkImageRequest, ImageVariant, Metrics, Seed, Style};
pub use errors::{GeneratorError, ImageError};
pub use ports::{FetchError, ImageFetchPort};
