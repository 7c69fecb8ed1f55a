//! Responsive image variants and their breakpoint presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named UI context an image is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ImageVariant {
    /// Thumbnail in a gallery grid.
    #[default]
    GalleryCard,
    /// Full artwork page.
    ArtworkDetail,
    /// Artist avatar.
    Avatar,
    /// Full-bleed banner.
    Hero,
}

impl ImageVariant {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::GalleryCard,
        Self::ArtworkDetail,
        Self::Avatar,
        Self::Hero,
    ];

    /// Returns the camelCase name of the variant.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GalleryCard => "galleryCard",
            Self::ArtworkDetail => "artworkDetail",
            Self::Avatar => "avatar",
            Self::Hero => "hero",
        }
    }

    /// Returns the preset breakpoint table for this variant.
    #[must_use]
    pub fn preset(self) -> VariantConfig {
        match self {
            Self::GalleryCard => VariantConfig::new(
                DimensionConfig::new(400, Some(300), 75),
                vec![
                    BreakpointConfig::new(Breakpoint::Md, 350, Some(263), 75),
                    BreakpointConfig::new(Breakpoint::Lg, 300, Some(225), 80),
                    BreakpointConfig::new(Breakpoint::Xl, 320, Some(240), 80),
                ],
            ),
            Self::ArtworkDetail => VariantConfig::new(
                DimensionConfig::new(640, None, 85),
                vec![
                    BreakpointConfig::new(Breakpoint::Md, 768, None, 85),
                    BreakpointConfig::new(Breakpoint::Lg, 1024, None, 90),
                    BreakpointConfig::new(Breakpoint::Xl, 1280, None, 90),
                ],
            ),
            Self::Avatar => VariantConfig::new(
                DimensionConfig::new(80, Some(80), 80),
                vec![
                    BreakpointConfig::new(Breakpoint::Md, 100, Some(100), 80),
                    BreakpointConfig::new(Breakpoint::Lg, 120, Some(120), 80),
                ],
            ),
            Self::Hero => VariantConfig::new(
                DimensionConfig::new(640, Some(360), 80),
                vec![
                    BreakpointConfig::new(Breakpoint::Md, 1024, Some(576), 85),
                    BreakpointConfig::new(Breakpoint::Lg, 1536, Some(864), 85),
                    BreakpointConfig::new(Breakpoint::Xl, 1920, Some(1080), 85),
                ],
            ),
        }
    }
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown image variant: {s}"))
    }
}

/// Viewport breakpoints, by minimum width in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    /// 640px.
    Sm,
    /// 768px.
    Md,
    /// 1024px.
    Lg,
    /// 1280px.
    Xl,
    /// 1536px.
    Xxl,
}

impl Breakpoint {
    /// Minimum viewport width at which the breakpoint applies.
    #[must_use]
    pub const fn min_width(self) -> u32 {
        match self {
            Self::Sm => 640,
            Self::Md => 768,
            Self::Lg => 1024,
            Self::Xl => 1280,
            Self::Xxl => 1536,
        }
    }

    /// Returns the breakpoint name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sm => "sm",
            Self::Md => "md",
            Self::Lg => "lg",
            Self::Xl => "xl",
            Self::Xxl => "2xl",
        }
    }
}

/// Concrete render dimensions and encoder quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels, if fixed.
    pub height: Option<u32>,
    /// Encoder quality, 1-100.
    pub quality: u8,
}

impl DimensionConfig {
    /// Creates a dimension config.
    #[must_use]
    pub const fn new(width: u32, height: Option<u32>, quality: u8) -> Self {
        Self {
            width,
            height,
            quality,
        }
    }
}

/// Dimensions that apply from a breakpoint upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointConfig {
    /// Breakpoint the entry applies from.
    pub breakpoint: Breakpoint,
    /// Dimensions at that breakpoint.
    #[serde(flatten)]
    pub dimensions: DimensionConfig,
}

impl BreakpointConfig {
    /// Creates a breakpoint entry.
    #[must_use]
    pub const fn new(breakpoint: Breakpoint, width: u32, height: Option<u32>, quality: u8) -> Self {
        Self {
            breakpoint,
            dimensions: DimensionConfig::new(width, height, quality),
        }
    }
}

/// Breakpoint table for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Dimensions below the first breakpoint.
    pub default: DimensionConfig,
    /// Breakpoint entries, kept sorted ascending by breakpoint width.
    pub breakpoints: Vec<BreakpointConfig>,
}

impl VariantConfig {
    /// Creates a table, sorting the entries ascending by breakpoint width.
    #[must_use]
    pub fn new(default: DimensionConfig, mut breakpoints: Vec<BreakpointConfig>) -> Self {
        breakpoints.sort_by_key(|entry| entry.breakpoint.min_width());
        Self {
            default,
            breakpoints,
        }
    }

    /// Returns the dimensions in effect at `viewport_width`.
    #[must_use]
    pub fn at_viewport(&self, viewport_width: u32) -> DimensionConfig {
        self.breakpoints
            .iter()
            .rev()
            .find(|entry| viewport_width >= entry.breakpoint.min_width())
            .map_or(self.default, |entry| entry.dimensions)
    }
}
