//! Pipeline services.

pub mod image_resolver;
pub mod procedural;
pub mod progressive;
pub mod proximity;
pub mod retrying_loader;
pub mod telemetry;
pub mod variant_selector;

pub use image_resolver::{ImageResolution, ImageSourceResolver, RenderedArtwork};
pub use procedural::ProceduralArtworkGenerator;
pub use progressive::{ErrorAffordance, ImageFrame, Placeholder};
pub use proximity::{ProximityObserver, ViewportTracker};
pub use retrying_loader::{
    LoadState, LoaderEvent, LoaderHandle, LoaderOptions, LoaderSnapshot, RetryingImageLoader,
};
pub use telemetry::TelemetryAggregator;
pub use variant_selector::VariantPlan;
