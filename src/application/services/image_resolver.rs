//! Artwork image façade: network image when possible, procedural art otherwise.

use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::procedural::ProceduralArtworkGenerator;
use super::progressive::Placeholder;
use super::proximity::ViewportTracker;
use super::retrying_loader::{LoaderEvent, RetryingImageLoader};
use super::variant_selector::{self, VariantPlan};
use crate::domain::entities::{ArtworkImageRequest, LoadPhase, Rect, Seed, Style};
use crate::domain::errors::ImageError;

/// Where an artwork's image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageResolution {
    /// Render procedurally.
    Fallback {
        /// Seed for the generator.
        seed: Seed,
        /// Style for the generator.
        style: Style,
    },
    /// Load over the network.
    Network {
        /// Source URL as supplied.
        url: String,
        /// Responsive plan for the URL.
        plan: VariantPlan,
    },
}

/// Final image for an artwork.
#[derive(Debug, Clone)]
pub enum RenderedArtwork {
    /// The network image loaded.
    Network {
        /// Decoded image.
        image: Arc<DynamicImage>,
        /// Responsive plan it was loaded with.
        plan: VariantPlan,
        /// Retries it took.
        retries: u32,
    },
    /// Procedural art stood in for the network image.
    Procedural {
        /// Rendered fallback.
        image: Arc<RgbaImage>,
        /// Seed it was rendered from.
        seed: Seed,
        /// Style it was rendered in.
        style: Style,
        /// Why the fallback was used.
        reason: ImageError,
    },
}

impl RenderedArtwork {
    /// Returns true if the procedural fallback is shown.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Procedural { .. })
    }

    /// Returns the pixel dimensions of the image.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Network { image, .. } => (image.width(), image.height()),
            Self::Procedural { image, .. } => image.dimensions(),
        }
    }
}

/// Decides between network and procedural images and drives the load.
#[derive(Debug, Clone)]
pub struct ImageSourceResolver {
    loader: RetryingImageLoader,
    generator: Arc<ProceduralArtworkGenerator>,
}

impl ImageSourceResolver {
    /// Creates a resolver.
    #[must_use]
    pub const fn new(loader: RetryingImageLoader, generator: Arc<ProceduralArtworkGenerator>) -> Self {
        Self { loader, generator }
    }

    /// Returns the underlying loader.
    #[must_use]
    pub const fn loader(&self) -> &RetryingImageLoader {
        &self.loader
    }

    /// Decides where the image for `request` comes from.
    #[must_use]
    pub fn resolve(&self, request: &ArtworkImageRequest) -> ImageResolution {
        match request.source_url() {
            Some(url) => ImageResolution::Network {
                url: url.to_string(),
                plan: variant_selector::plan(request.variant, url, request.aspect_ratio),
            },
            None => ImageResolution::Fallback {
                seed: request.seed(),
                style: request.style(),
            },
        }
    }

    /// Returns the placeholder shown while `request` loads.
    #[must_use]
    pub fn placeholder(&self, request: &ArtworkImageRequest) -> Placeholder {
        if self.loader.options().progressive {
            Placeholder::for_artwork(&request.seed(), request.style())
        } else {
            Placeholder::Embedded
        }
    }

    /// Produces the image for `request`. Never fails: anything short of a
    /// loaded network image becomes procedural art.
    pub async fn render(
        &self,
        request: &ArtworkImageRequest,
        placement: Option<(&ViewportTracker, Rect)>,
        events: Option<mpsc::UnboundedSender<LoaderEvent>>,
    ) -> RenderedArtwork {
        let (url, plan) = match self.resolve(request) {
            ImageResolution::Fallback { seed, style } => {
                debug!(title = %request.title, "No image source, rendering fallback");
                return self.fallback(request, seed, style, ImageError::NoSource);
            }
            ImageResolution::Network { url, plan } => (url, plan),
        };

        let loader = self.loader.with_priority(request.priority);
        let mut handle = loader.mount(&plan.src, placement, events);
        let snapshot = handle.settled().await;
        handle.unmount().await;

        match (snapshot.state.phase(), snapshot.image) {
            (LoadPhase::Loaded, Some(image)) => RenderedArtwork::Network {
                image,
                plan,
                retries: snapshot.state.retry_count(),
            },
            _ => {
                let message = snapshot
                    .last_error
                    .map_or_else(|| "load cancelled".to_string(), |e| e.to_string());
                info!(url = %url, "Falling back to procedural artwork");
                let reason =
                    ImageError::retry_exhausted(url, snapshot.state.retry_count(), message);
                self.fallback(request, request.seed(), request.style(), reason)
            }
        }
    }

    fn fallback(
        &self,
        request: &ArtworkImageRequest,
        seed: Seed,
        style: Style,
        reason: ImageError,
    ) -> RenderedArtwork {
        let (width, height) = fallback_canvas(request);
        RenderedArtwork::Procedural {
            image: self.generator.generate(&seed, width, height, style),
            seed,
            style,
            reason,
        }
    }
}

/// Canvas for a fallback: the variant's default width, with the preset
/// height, the aspect-ratio height, or a square.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fallback_canvas(request: &ArtworkImageRequest) -> (u32, u32) {
    let dimensions = request.variant.preset().default;
    let height = dimensions.height.unwrap_or_else(|| {
        request
            .aspect_ratio
            .filter(|r| r.is_finite() && *r > 0.0)
            .map_or(dimensions.width, |ratio| {
                (f64::from(dimensions.width) / f64::from(ratio)).round() as u32
            })
    });
    (dimensions.width, height.max(1))
}
