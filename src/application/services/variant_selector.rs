//! Responsive variant selection: `sizes` and density `srcset` descriptors.
//!
//! Everything here is a pure function of its inputs.

use std::fmt::Write as _;

use crate::domain::entities::{DimensionConfig, ImageVariant, VariantConfig};
use crate::domain::url_params::set_query_params;

/// Pixel densities every source set covers.
pub const DENSITIES: [f32; 4] = [1.0, 1.5, 2.0, 3.0];

/// One entry of a density source set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensitySource {
    /// Density descriptor, e.g. `"1.5x"`.
    pub descriptor: String,
    /// Requested width in device pixels.
    pub width: u32,
    /// Requested height in device pixels, if fixed.
    pub height: Option<u32>,
    /// URL carrying the sizing parameters.
    pub url: String,
}

/// Everything a page needs to render one responsive image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPlan {
    /// Variant the plan was built for.
    pub variant: ImageVariant,
    /// Breakpoint table, heights filled in from the aspect ratio if needed.
    pub config: VariantConfig,
    /// `sizes` attribute value.
    pub sizes: String,
    /// 1x URL for the default dimensions.
    pub src: String,
    /// `srcset` attribute value for the default dimensions.
    pub srcset: String,
}

impl VariantPlan {
    /// Returns the 1x URL for the dimensions in effect at `viewport_width`.
    #[must_use]
    pub fn src_for_viewport(&self, base_url: &str, viewport_width: u32) -> String {
        sized_url(base_url, self.config.at_viewport(viewport_width), 1.0).0
    }
}

/// Returns the preset dimensions for `variant` at `viewport_width`.
#[must_use]
pub fn select(variant: ImageVariant, viewport_width: u32) -> DimensionConfig {
    variant.preset().at_viewport(viewport_width)
}

/// Builds the `sizes` descriptor: breakpoints ascending, then the default width.
#[must_use]
pub fn sizes(config: &VariantConfig) -> String {
    let mut entries: Vec<_> = config.breakpoints.iter().collect();
    entries.sort_by_key(|entry| entry.breakpoint.min_width());

    let mut out = String::new();
    for entry in entries {
        let _ = write!(
            out,
            "(min-width: {}px) {}px, ",
            entry.breakpoint.min_width(),
            entry.dimensions.width
        );
    }
    let _ = write!(out, "{}px", config.default.width);
    out
}

/// Builds one source per entry of [`DENSITIES`].
#[must_use]
pub fn density_sources(url: &str, dimensions: DimensionConfig) -> Vec<DensitySource> {
    DENSITIES
        .iter()
        .map(|&density| {
            let (url, width, height) = sized_url(url, dimensions, density);
            DensitySource {
                descriptor: format!("{density}x"),
                width,
                height,
                url,
            }
        })
        .collect()
}

/// Builds the `srcset` descriptor for `dimensions`.
#[must_use]
pub fn srcset(url: &str, dimensions: DimensionConfig) -> String {
    density_sources(url, dimensions)
        .into_iter()
        .map(|source| format!("{} {}", source.url, source.descriptor))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the full plan for `variant` served from `url`.
#[must_use]
pub fn plan(variant: ImageVariant, url: &str, aspect_ratio: Option<f32>) -> VariantPlan {
    let mut config = variant.preset();
    if let Some(ratio) = aspect_ratio.filter(|r| r.is_finite() && *r > 0.0) {
        fill_height(&mut config.default, ratio);
        for entry in &mut config.breakpoints {
            fill_height(&mut entry.dimensions, ratio);
        }
    }

    VariantPlan {
        variant,
        sizes: sizes(&config),
        src: sized_url(url, config.default, 1.0).0,
        srcset: srcset(url, config.default),
        config,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fill_height(dimensions: &mut DimensionConfig, ratio: f32) {
    if dimensions.height.is_none() {
        let height = (f64::from(dimensions.width) / f64::from(ratio)).round();
        dimensions.height = Some((height as u32).max(1));
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(value: u32, density: f32) -> u32 {
    (f64::from(value) * f64::from(density)).round() as u32
}

fn sized_url(url: &str, dimensions: DimensionConfig, density: f32) -> (String, u32, Option<u32>) {
    let width = scale(dimensions.width, density);
    let height = dimensions.height.map(|h| scale(h, density));

    let mut params = vec![("w", width.to_string())];
    if let Some(height) = height {
        params.push(("h", height.to_string()));
    }
    params.push(("q", dimensions.quality.to_string()));

    (set_query_params(url, &params), width, height)
}
