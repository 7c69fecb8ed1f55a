//! Image handling infrastructure.
//!
//! This module provides:
//! - HTTP fetching with in-memory LRU caching of decoded images

pub mod http_fetcher;
pub mod memory_cache;

pub use http_fetcher::{HttpFetcherConfig, HttpImageFetcher};
pub use memory_cache::{CacheStats, MemoryImageCache};
