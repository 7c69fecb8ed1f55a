//! Domain error types.

mod generator_error;
mod image_error;

pub use generator_error::GeneratorError;
pub use image_error::ImageError;
