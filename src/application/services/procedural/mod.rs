//! Deterministic procedural artwork, used whenever a real image is unavailable.
//!
//! Rendering happens in two steps:
//! - [`sketch`] turns `(seed, style, size)` into an ordered list of drawing
//!   primitives, consuming one seeded random stream;
//! - [`raster::rasterize`] paints those primitives with `tiny-skia`.
//!
//! If painting fails for any reason the caller still gets an image: a fixed
//! two-color gradient.

pub mod palette;
pub mod random;
pub mod raster;
pub mod sketch;
mod styles;

use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::Arc;

use image::RgbaImage;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::domain::entities::{Seed, Style};

pub use sketch::Sketch;
pub use styles::{HORIZON, sketch};

/// Largest canvas edge the generator will allocate.
pub const MAX_EDGE: u32 = 4096;

/// Default number of renders kept in memory.
pub const DEFAULT_CACHE_SIZE: usize = 64;

/// Renders `seed` in `style` at the given size.
///
/// Dimensions are clamped to `1..=MAX_EDGE`. Never fails.
#[must_use]
pub fn generate(seed: &Seed, width: u32, height: u32, style: Style) -> RgbaImage {
    let (width, height) = clamp_canvas(width, height);
    let sketch = sketch(seed, width, height, style);

    match raster::rasterize(&sketch) {
        Ok(image) => image,
        Err(e) => {
            warn!(seed = %seed, style = %style, error = %e, "Procedural render failed, using plain gradient");
            raster::safe_gradient(width, height)
        }
    }
}

/// Encodes a render as PNG.
///
/// # Errors
/// Returns error if the encoder fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

fn clamp_canvas(width: u32, height: u32) -> (u32, u32) {
    (width.clamp(1, MAX_EDGE), height.clamp(1, MAX_EDGE))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RenderKey {
    seed: Seed,
    style: Style,
    width: u32,
    height: u32,
}

/// Memoizing front for [`generate`].
///
/// Renders are deterministic, so a cached render is indistinguishable from a
/// fresh one.
pub struct ProceduralArtworkGenerator {
    cache: Mutex<LruCache<RenderKey, Arc<RgbaImage>>>,
}

impl ProceduralArtworkGenerator {
    /// Creates a generator keeping up to `capacity` renders.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Returns the render for `seed` in `style`, from cache when possible.
    pub fn generate(&self, seed: &Seed, width: u32, height: u32, style: Style) -> Arc<RgbaImage> {
        let (width, height) = clamp_canvas(width, height);
        let key = RenderKey {
            seed: seed.clone(),
            style,
            width,
            height,
        };

        if let Some(image) = self.cache.lock().get(&key) {
            trace!(seed = %seed, "Procedural cache hit");
            return image.clone();
        }

        let image = Arc::new(generate(seed, width, height, style));
        debug!(seed = %seed, style = %style, width, height, "Rendered procedural artwork");
        self.cache.lock().put(key, image.clone());
        image
    }

    /// Returns the number of cached renders.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}

impl Default for ProceduralArtworkGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl std::fmt::Debug for ProceduralArtworkGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProceduralArtworkGenerator")
            .field("cached", &self.cached())
            .finish()
    }
}
