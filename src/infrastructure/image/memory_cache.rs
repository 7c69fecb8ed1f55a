//! In-memory LRU of decoded network images.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::DynamicImage;
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::domain::entities::ImageId;

/// Default number of decoded images kept in memory.
pub const DEFAULT_CACHE_SIZE: usize = 128;

/// Decoded images keyed by URL hash.
pub struct MemoryImageCache {
    cache: RwLock<LruCache<ImageId, Arc<DynamicImage>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a cache holding up to `capacity` images.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns hit/miss counters.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_rate: if total > 0 {
                hits as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            size: self.len(),
        }
    }

    /// Looks up an image, promoting it in the LRU.
    pub async fn get(&self, id: &ImageId) -> Option<Arc<DynamicImage>> {
        let found = self.cache.write().await.get(id).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(id = %id, "Memory cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(id = %id, "Memory cache miss");
        }
        found
    }

    /// Stores an image.
    pub async fn put(&self, id: ImageId, image: Arc<DynamicImage>) {
        debug!(id = %id, "Caching decoded image");
        self.cache.write().await.put(id, image);
    }

    /// Best-effort count; zero while a writer holds the lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.try_read().map_or(0, |cache| cache.len())
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl std::fmt::Debug for MemoryImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImageCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Cache counters.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Lookups that found an image.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Hits as a percentage of lookups.
    pub hit_rate: f64,
    /// Images currently cached.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(side: u32) -> Arc<DynamicImage> {
        Arc::new(DynamicImage::new_rgb8(side, side))
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = MemoryImageCache::new(4);
        let id = ImageId::from_url("https://cdn.test/a.jpg");

        cache.put(id.clone(), image(64)).await;
        assert_eq!(cache.get(&id).await.map(|img| img.width()), Some(64));
        assert!(cache.get(&ImageId::from_url("https://cdn.test/missing.jpg")).await.is_none());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_least_recently_used_is_evicted() {
        let cache = MemoryImageCache::new(2);
        let [a, b, c] = ["a", "b", "c"].map(|name| ImageId::from_url(&format!("https://cdn.test/{name}.jpg")));
        assert!(cache.is_empty());

        cache.put(a.clone(), image(1)).await;
        cache.put(b.clone(), image(1)).await;
        let _ = cache.get(&a).await;
        cache.put(c.clone(), image(1)).await;

        assert!(cache.get(&b).await.is_none());
        assert!(cache.get(&a).await.is_some());
        assert!(cache.get(&c).await.is_some());
        assert_eq!(cache.len(), 2);
    }
}
