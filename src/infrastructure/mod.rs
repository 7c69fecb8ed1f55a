//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Image fetching, caching and URL rewriting.
pub mod image;

pub use config::{AppConfig, CliArgs, Command, ConfigError, LogLevel, StorageManager};
pub use image::{CacheStats, HttpFetcherConfig, HttpImageFetcher, MemoryImageCache};
