//! Domain types for image loading.

/// Unique identifier for a cached image.
/// Generated from a hash of the URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(pub String);

impl ImageId {
    /// Creates an `ImageId` from a URL by hashing it.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let result = hasher.finalize();
        Self(hex::encode(&result[..16]))
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phase of a single image in the loading pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Waiting for the element to approach the viewport.
    #[default]
    Idle,
    /// Fetch in flight.
    Loading,
    /// Fetch in flight after an automatic or manual retry.
    Retrying,
    /// Image is ready for display.
    Loaded,
    /// Retries are exhausted; only a manual retry leaves this phase.
    Error,
}

impl LoadPhase {
    /// Returns true while a fetch is in flight.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading | Self::Retrying)
    }

    /// Returns true once the load has settled, successfully or not.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Loaded | Self::Error)
    }
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Retrying => write!(f, "retrying"),
            Self::Loaded => write!(f, "loaded"),
            Self::Error => write!(f, "error"),
        }
    }
}
