//! Domain entity definitions.

mod artwork;
mod image;
mod metrics;
mod variant;
mod viewport;

pub use artwork::{ArtworkImageRequest, Seed, Style, UnknownStyle};
pub use image::{ImageId, LoadPhase};
pub use metrics::{LoadSample, Metrics, TelemetryEvent};
pub use variant::{Breakpoint, BreakpointConfig, DimensionConfig, ImageVariant, VariantConfig};
pub use viewport::Rect;
