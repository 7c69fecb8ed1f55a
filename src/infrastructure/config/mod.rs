//! Application configuration.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{AppConfig, GeneratorConfig, LoaderConfig, LogLevel, TelemetryConfig};
pub use args::{CliArgs, Command};
pub use storage::{ConfigError, StorageManager};
