//! Blur-up placeholders and per-state presentation.

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;

use crate::domain::entities::{LoadPhase, Seed, Style};

use super::procedural;

/// Opacity of the placeholder while the real image loads.
pub const PLACEHOLDER_OPACITY: f32 = 0.6;

/// Duration of the placeholder-to-image cross-fade.
pub const CROSS_FADE: Duration = Duration::from_millis(300);

/// Edge length of generated placeholders before upscaling.
pub const PLACEHOLDER_EDGE: u32 = 16;

const PLACEHOLDER_BLUR: f32 = 2.0;

/// Low-fidelity stand-in shown while loading.
#[derive(Debug, Clone, Default)]
pub enum Placeholder {
    /// Tiny blurred render derived from the artwork's seed.
    Generated(Arc<RgbaImage>),
    /// Fixed neutral gradient.
    #[default]
    Embedded,
}

impl Placeholder {
    /// Renders a blurred placeholder for an artwork.
    #[must_use]
    pub fn for_artwork(seed: &Seed, style: Style) -> Self {
        let tiny = procedural::generate(seed, PLACEHOLDER_EDGE, PLACEHOLDER_EDGE, style);
        Self::Generated(Arc::new(image::imageops::blur(&tiny, PLACEHOLDER_BLUR)))
    }

    /// Returns the placeholder pixels.
    #[must_use]
    pub fn image(&self) -> Arc<RgbaImage> {
        match self {
            Self::Generated(image) => image.clone(),
            Self::Embedded => Arc::new(embedded()),
        }
    }
}

/// 8x8 light-gray vertical gradient.
fn embedded() -> RgbaImage {
    RgbaImage::from_fn(8, 8, |_, y| {
        #[allow(clippy::cast_possible_truncation)]
        let shade = 0xE5 - (y * 4) as u8;
        image::Rgba([shade, shade, shade.saturating_add(4), 0xFF])
    })
}

/// Inline notice shown when an image gave up loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorAffordance {
    /// Number of retries already made.
    pub retries: u32,
}

impl ErrorAffordance {
    /// Label of the manual retry action.
    pub const ACTION: &'static str = "Retry";
}

impl std::fmt::Display for ErrorAffordance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.retries {
            0 => write!(f, "Image failed to load"),
            1 => write!(f, "Image failed to load, retried 1 time"),
            n => write!(f, "Image failed to load, retried {n} times"),
        }
    }
}

/// What to draw for one loader state.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    /// Placeholder opacity, `None` when no placeholder is drawn.
    pub placeholder_opacity: Option<f32>,
    /// Opacity of the real image.
    pub image_opacity: f32,
    /// Transition applied to opacity changes.
    pub transition: Duration,
    /// Failure notice, when the load gave up.
    pub error: Option<ErrorAffordance>,
}

impl ImageFrame {
    /// Builds the frame for `phase`.
    #[must_use]
    pub fn for_phase(phase: LoadPhase, retries: u32, progressive: bool) -> Self {
        let placeholder = |opacity: f32| progressive.then_some(opacity);
        match phase {
            LoadPhase::Idle | LoadPhase::Loading | LoadPhase::Retrying => Self {
                placeholder_opacity: placeholder(PLACEHOLDER_OPACITY),
                image_opacity: 0.0,
                transition: CROSS_FADE,
                error: None,
            },
            LoadPhase::Loaded => Self {
                placeholder_opacity: placeholder(0.0),
                image_opacity: 1.0,
                transition: CROSS_FADE,
                error: None,
            },
            LoadPhase::Error => Self {
                placeholder_opacity: None,
                image_opacity: 0.0,
                transition: Duration::ZERO,
                error: Some(ErrorAffordance { retries }),
            },
        }
    }
}
