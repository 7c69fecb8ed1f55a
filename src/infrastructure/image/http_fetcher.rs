//! `reqwest` adapter for [`ImageFetchPort`].

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::DynamicImage;
use reqwest::StatusCode;
use tracing::{debug, trace};

use crate::domain::entities::ImageId;
use crate::domain::ports::{FetchError, FetchResult, ImageFetchPort};
use crate::domain::url_params::strip_cache_bust;

use super::memory_cache::{CacheStats, DEFAULT_CACHE_SIZE, MemoryImageCache};

/// HTTP fetcher settings.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Decoded images kept in memory.
    pub memory_cache_size: usize,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            memory_cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

/// Downloads and decodes images, memoizing decoded results.
///
/// Cache-busting parameters are ignored for cache lookups, so a retry of an
/// image that has since loaded elsewhere on the page is served from memory.
pub struct HttpImageFetcher {
    client: reqwest::Client,
    cache: MemoryImageCache,
    config: HttpFetcherConfig,
}

impl HttpImageFetcher {
    /// Creates a fetcher.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: HttpFetcherConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("artframe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            cache: MemoryImageCache::new(config.memory_cache_size),
            config,
        })
    }

    /// Returns memory cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn download(&self, url: &str) -> FetchResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(format!("Request failed: {e}")))?;

        check_status(response.status())?;

        response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkError(format!("Failed to read body: {e}")))
    }
}

impl std::fmt::Debug for HttpImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageFetcher")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<Arc<DynamicImage>> {
        let id = ImageId::from_url(&strip_cache_bust(url));
        if let Some(image) = self.cache.get(&id).await {
            trace!(url = %url, "Serving image from memory");
            return Ok(image);
        }

        debug!(url = %url, "Downloading image");
        let bytes = self.download(url).await?;
        let size = bytes.len();

        let image = Arc::new(decode(bytes).await?);
        debug!(url = %url, bytes = size, width = image.width(), height = image.height(), "Decoded image");

        self.cache.put(id, image.clone()).await;
        Ok(image)
    }
}

fn check_status(status: StatusCode) -> FetchResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }
}

async fn decode(bytes: Bytes) -> FetchResult<DynamicImage> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| FetchError::DecodeError(format!("Decode task panicked: {e}")))?
        .map_err(|e| FetchError::DecodeError(format!("Failed to decode image: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Bytes {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgba8(3, 2)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        Bytes::from(buffer.into_inner())
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert_eq!(
            check_status(StatusCode::NOT_FOUND),
            Err(FetchError::HttpStatus {
                status: 404,
                reason: "Not Found".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_decode_png() {
        let image = decode(png_bytes()).await.unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
    }

    #[tokio::test]
    async fn test_decode_garbage_is_decode_error() {
        let result = decode(Bytes::from_static(b"not an image")).await;
        assert!(matches!(result, Err(FetchError::DecodeError(_))));
    }

    #[tokio::test]
    async fn test_retry_url_served_from_cache() {
        let fetcher = HttpImageFetcher::new(HttpFetcherConfig::default()).unwrap();
        let cached = Arc::new(DynamicImage::new_rgba8(5, 5));
        fetcher
            .cache
            .put(ImageId::from_url("https://cdn.invalid/a.jpg?w=400"), cached.clone())
            .await;

        let image = fetcher
            .fetch("https://cdn.invalid/a.jpg?w=400&retry=2&t=1700000000000")
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&image, &cached));
        assert_eq!(fetcher.cache_stats().hits, 1);
    }
}
