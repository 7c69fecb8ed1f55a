//! Viewport geometry used by the lazy-load proximity trigger.

/// Axis-aligned rectangle in CSS pixels, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the rectangle grown by `margin` on every side.
    #[must_use]
    pub fn inflate(self, margin: f32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: margin.mul_add(2.0, self.width),
            height: margin.mul_add(2.0, self.height),
        }
    }

    /// Returns true if the rectangles overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x <= other.x + other.width
            && other.x <= self.x + self.width
            && self.y <= other.y + other.height
            && other.y <= self.y + self.height
    }

    /// Returns true if `element` lies within `margin` pixels of `self`.
    #[must_use]
    pub fn is_near(&self, element: &Self, margin: f32) -> bool {
        self.inflate(margin).intersects(element)
    }
}
