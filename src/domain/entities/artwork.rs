//! Artwork-facing inputs to the image pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::variant::ImageVariant;

/// Visual style used by the procedural renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Radial gradient with translucent circles.
    #[default]
    Abstract,
    /// Diagonal gradient with rotated blocks.
    Digital,
    /// Vertical wash with curved brush strokes.
    Painting,
    /// Sky and ground bands with a simple landscape.
    Photography,
    /// Rendered as [`Style::Abstract`].
    Sculpture,
    /// Picks one concrete style from the seed.
    Mixed,
}

/// Category names (and common aliases) mapped to their style.
const CATEGORY_TABLE: &[(&str, Style)] = &[
    ("abstract", Style::Abstract),
    ("digital", Style::Digital),
    ("digital art", Style::Digital),
    ("painting", Style::Painting),
    ("paintings", Style::Painting),
    ("photography", Style::Photography),
    ("photo", Style::Photography),
    ("sculpture", Style::Sculpture),
    ("mixed", Style::Mixed),
    ("mixed media", Style::Mixed),
];

impl Style {
    /// Styles a `Mixed` render can resolve to.
    pub const CONCRETE: [Self; 4] = [
        Self::Abstract,
        Self::Digital,
        Self::Painting,
        Self::Photography,
    ];

    /// Resolves a free-form category to a style, defaulting to `Abstract`.
    #[must_use]
    pub fn from_category(category: &str) -> Self {
        category.parse().unwrap_or_default()
    }

    /// Returns the lowercase name of the style.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Digital => "digital",
            Self::Painting => "painting",
            Self::Photography => "photography",
            Self::Sculpture => "sculpture",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category string names no known style.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown artwork style: {0}")]
pub struct UnknownStyle(pub String);

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        CATEGORY_TABLE
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, style)| *style)
            .ok_or(UnknownStyle(normalized))
    }
}

/// Deterministic input to the procedural renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Seed(String);

impl Seed {
    /// Creates a seed from any caller-supplied identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Creates the seed used for an artwork's fallback image.
    #[must_use]
    pub fn from_artwork(title: &str, category: &str) -> Self {
        Self(format!("{title}:{category}"))
    }

    /// Returns the seed text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A page's request for one artwork image.
#[derive(Debug, Clone)]
pub struct ArtworkImageRequest {
    /// Artwork title.
    pub title: String,
    /// Artwork category as stored by the catalog.
    pub category: String,
    /// Remote image location, if the artwork has one.
    pub image_url: Option<String>,
    /// UI context the image is rendered in.
    pub variant: ImageVariant,
    /// Load eagerly instead of waiting for viewport proximity.
    pub priority: bool,
    /// Width / height ratio used when the variant has no fixed height.
    pub aspect_ratio: Option<f32>,
}

impl ArtworkImageRequest {
    /// Creates a request with no image URL, gallery-card variant and lazy loading.
    #[must_use]
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            image_url: None,
            variant: ImageVariant::GalleryCard,
            priority: false,
            aspect_ratio: None,
        }
    }

    /// Sets the remote image URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Sets the variant.
    #[must_use]
    pub const fn with_variant(mut self, variant: ImageVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Marks the image as above-the-fold.
    #[must_use]
    pub const fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the aspect ratio.
    #[must_use]
    pub const fn with_aspect_ratio(mut self, ratio: f32) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Returns the trimmed URL, or `None` when there is nothing to fetch.
    #[must_use]
    pub fn source_url(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Returns the fallback seed for this artwork.
    #[must_use]
    pub fn seed(&self) -> Seed {
        Seed::from_artwork(&self.title, &self.category)
    }

    /// Returns the fallback style for this artwork.
    #[must_use]
    pub fn style(&self) -> Style {
        Style::from_category(&self.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("abstract", Style::Abstract ; "abstract")]
    #[test_case("Photography", Style::Photography ; "case_insensitive")]
    #[test_case(" mixed media ", Style::Mixed ; "alias_with_whitespace")]
    #[test_case("sculpture", Style::Sculpture ; "sculpture")]
    #[test_case("ceramics", Style::Abstract ; "unknown_defaults_to_abstract")]
    fn test_style_from_category(category: &str, expected: Style) {
        assert_eq!(Style::from_category(category), expected);
    }

    #[test]
    fn test_unknown_style_parse_error() {
        let err = "ceramics".parse::<Style>().unwrap_err();
        assert_eq!(err, UnknownStyle("ceramics".to_string()));
    }

    #[test]
    fn test_source_url_treats_blank_as_missing() {
        let request = ArtworkImageRequest::new("Ocean", "photography").with_url("   ");
        assert_eq!(request.source_url(), None);

        let request = ArtworkImageRequest::new("Ocean", "photography");
        assert_eq!(request.source_url(), None);

        let request =
            ArtworkImageRequest::new("Ocean", "photography").with_url(" https://img/a.jpg ");
        assert_eq!(request.source_url(), Some("https://img/a.jpg"));
    }

    #[test]
    fn test_seed_from_artwork() {
        let request = ArtworkImageRequest::new("Sunset over Hills", "abstract");
        assert_eq!(request.seed().as_str(), "Sunset over Hills:abstract");
    }
}
