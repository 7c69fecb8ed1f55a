//! Application layer: the image pipeline services.

/// Generator, loader, selector, telemetry and resolver.
pub mod services;

pub use services::{
    ImageResolution, ImageSourceResolver, LoaderOptions, ProceduralArtworkGenerator,
    RenderedArtwork, RetryingImageLoader, TelemetryAggregator, ViewportTracker,
};
