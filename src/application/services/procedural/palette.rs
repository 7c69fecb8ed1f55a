//! Colors, hue bands and the curated background palettes.

use super::random::SeededRandom;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba {
    /// Opaque color from a `0xRRGGBB` literal.
    #[must_use]
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
            a: 0xFF,
        }
    }
}

/// Hue / saturation / lightness color with alpha, all but hue in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    /// Hue in degrees, `[0, 360)`.
    pub hue: f32,
    /// Saturation.
    pub saturation: f32,
    /// Lightness.
    pub lightness: f32,
    /// Opacity.
    pub alpha: f32,
}

impl Hsla {
    /// Converts to 8-bit RGBA.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgba(self) -> Rgba {
        let s = self.saturation.clamp(0.0, 1.0);
        let l = self.lightness.clamp(0.0, 1.0);
        let h = self.hue.rem_euclid(360.0) / 60.0;

        let chroma = (1.0 - 2.0_f32.mul_add(l, -1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;

        Rgba {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            a: channel_alpha(self.alpha),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel_alpha(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Half-open hue interval `[start, end)` in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueBand {
    /// Inclusive lower bound.
    pub start: f32,
    /// Exclusive upper bound.
    pub end: f32,
}

impl HueBand {
    /// Creates a band.
    #[must_use]
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    const fn width(self) -> f32 {
        self.end - self.start
    }

    /// Returns true if `hue` falls inside the band.
    #[must_use]
    pub fn contains(self, hue: f32) -> bool {
        hue >= self.start && hue < self.end
    }

    /// Returns true if the band shares any hue with `other`.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Yellow-orange hues that read as brown at the saturations used here.
pub const MUDDY: HueBand = HueBand::new(30.0, 60.0);

/// The full wheel minus [`MUDDY`].
pub const OPEN_HUES: &[HueBand] = &[HueBand::new(0.0, 30.0), HueBand::new(60.0, 360.0)];

/// Cyan, blue-violet and magenta.
pub const NEON_HUES: &[HueBand] = &[
    HueBand::new(170.0, 200.0),
    HueBand::new(250.0, 290.0),
    HueBand::new(300.0, 330.0),
];

/// Foliage greens.
pub const GREEN_HUES: &[HueBand] = &[HueBand::new(90.0, 150.0)];

/// Water and distant-hill blues.
pub const BLUE_HUES: &[HueBand] = &[HueBand::new(190.0, 240.0)];

/// Samples a hue uniformly across `bands`.
///
/// Bands must be non-empty and must not overlap [`MUDDY`].
pub fn sample_hue(rng: &mut SeededRandom, bands: &[HueBand]) -> f32 {
    let total: f32 = bands.iter().map(|band| band.width()).sum();
    let mut offset = rng.range(0.0, total);
    for band in bands {
        if offset < band.width() {
            return band.start + offset;
        }
        offset -= band.width();
    }
    // Float accumulation can leave `offset` a hair past the last band.
    bands.last().map_or(0.0, |band| band.start)
}

/// Gradient stops for the abstract radial background, center outwards.
pub const ABSTRACT_PALETTES: &[[Rgba; 3]] = &[
    [Rgba::hex(0x667EEA), Rgba::hex(0x764BA2), Rgba::hex(0x2D1B4E)],
    [Rgba::hex(0xF093FB), Rgba::hex(0xF5576C), Rgba::hex(0x4A102A)],
    [Rgba::hex(0x4FACFE), Rgba::hex(0x00F2FE), Rgba::hex(0x0B3D5C)],
    [Rgba::hex(0x43E97B), Rgba::hex(0x38F9D7), Rgba::hex(0x0F3D3E)],
];

/// Diagonal stops for digital art.
pub const DIGITAL_PALETTES: &[[Rgba; 3]] = &[
    [Rgba::hex(0x0F0C29), Rgba::hex(0x302B63), Rgba::hex(0x24243E)],
    [Rgba::hex(0x000428), Rgba::hex(0x004E92), Rgba::hex(0x0A0A23)],
    [Rgba::hex(0x1A1A2E), Rgba::hex(0x16213E), Rgba::hex(0x0F3460)],
];

/// Top-to-bottom washes for paintings.
pub const PAINTING_PALETTES: &[[Rgba; 3]] = &[
    [Rgba::hex(0xE0EAFC), Rgba::hex(0xCFDEF3), Rgba::hex(0xA1C4FD)],
    [Rgba::hex(0xFDFBFB), Rgba::hex(0xEBEDEE), Rgba::hex(0xC2E9FB)],
    [Rgba::hex(0xFBC2EB), Rgba::hex(0xA6C1EE), Rgba::hex(0x8EC5FC)],
];

/// Sky stops, zenith to horizon.
pub const SKY_PALETTES: &[[Rgba; 3]] = &[
    [Rgba::hex(0x1E3C72), Rgba::hex(0x2A5298), Rgba::hex(0x89ABE3)],
    [Rgba::hex(0x2C3E50), Rgba::hex(0x4CA1AF), Rgba::hex(0xC4E0E5)],
    [Rgba::hex(0x0F2027), Rgba::hex(0x20363A), Rgba::hex(0x5B86E5)],
];

/// Ground band stops, horizon to bottom edge.
pub const GROUND: [Rgba; 2] = [Rgba::hex(0x1B2A1F), Rgba::hex(0x0B120D)];

/// Colors of the last-resort gradient.
pub const SAFE_GRADIENT: [Rgba; 2] = [Rgba::hex(0x667EEA), Rgba::hex(0x764BA2)];
