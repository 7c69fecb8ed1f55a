//! Backend-independent description of a procedural render.

use crate::domain::entities::Style;

use super::palette::{Hsla, Rgba};

/// Smallest extent any drawn primitive is allowed to have.
pub const MIN_EXTENT: f32 = 1.0;

/// Clamps a radius, width or height to a positive, finite value.
#[must_use]
pub fn positive(value: f32) -> f32 {
    if value.is_finite() {
        value.max(MIN_EXTENT)
    } else {
        MIN_EXTENT
    }
}

/// 2D point in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Gradient stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position along the gradient, `[0, 1]`.
    pub offset: f32,
    /// Color at that position.
    pub color: Rgba,
}

/// Evenly spaced stops over a palette entry.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn even_stops(colors: &[Rgba]) -> Vec<ColorStop> {
    let last = colors.len().saturating_sub(1).max(1) as f32;
    colors
        .iter()
        .enumerate()
        .map(|(i, color)| ColorStop {
            offset: i as f32 / last,
            color: *color,
        })
        .collect()
}

/// Gradient geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Gradient {
    /// Linear gradient between two points.
    Linear {
        /// Where the first stop sits.
        start: Point,
        /// Where the last stop sits.
        end: Point,
        /// Stops, ascending by offset.
        stops: Vec<ColorStop>,
    },
    /// Radial gradient from a center outwards.
    Radial {
        /// Center of the first stop.
        center: Point,
        /// Distance to the last stop.
        radius: f32,
        /// Stops, ascending by offset.
        stops: Vec<ColorStop>,
    },
}

/// A gradient painted over an axis-aligned area.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientFill {
    /// Top-left corner.
    pub origin: Point,
    /// Area width.
    pub width: f32,
    /// Area height.
    pub height: f32,
    /// Paint.
    pub gradient: Gradient,
}

/// Translucent overlay primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Filled circle.
    Circle {
        /// Center.
        center: Point,
        /// Radius.
        radius: f32,
        /// Fill.
        color: Hsla,
    },
    /// Filled rectangle rotated about its center.
    Block {
        /// Top-left corner before rotation.
        origin: Point,
        /// Width.
        width: f32,
        /// Height.
        height: f32,
        /// Rotation in degrees.
        rotation: f32,
        /// Fill.
        color: Hsla,
    },
    /// Cubic brush stroke.
    Stroke {
        /// Start point.
        from: Point,
        /// First control point.
        control_a: Point,
        /// Second control point.
        control_b: Point,
        /// End point.
        to: Point,
        /// Stroke width.
        width: f32,
        /// Stroke color.
        color: Hsla,
    },
}

impl Shape {
    /// Returns the shape's color.
    #[must_use]
    pub const fn color(&self) -> Hsla {
        match self {
            Self::Circle { color, .. } | Self::Block { color, .. } | Self::Stroke { color, .. } => {
                *color
            }
        }
    }
}

/// Ordered drawing instructions for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Concrete style the sketch was drawn in.
    pub style: Style,
    /// Background layers, painted first and in order.
    pub background: Vec<GradientFill>,
    /// Overlay shapes, painted in order over the background.
    pub shapes: Vec<Shape>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_clamps_degenerate_values() {
        assert!((positive(-3.0) - MIN_EXTENT).abs() < f32::EPSILON);
        assert!((positive(0.0) - MIN_EXTENT).abs() < f32::EPSILON);
        assert!((positive(f32::NAN) - MIN_EXTENT).abs() < f32::EPSILON);
        assert!((positive(12.5) - 12.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_even_stops() {
        let stops = even_stops(&[Rgba::hex(0x000000), Rgba::hex(0x808080), Rgba::hex(0xFFFFFF)]);
        let offsets: Vec<f32> = stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
    }
}
