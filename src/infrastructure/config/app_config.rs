//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;

const APP_NAME: &str = "artframe";
const APP_QUALIFIER: &str = "org";
const APP_ORGANIZATION: &str = "artframe";

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Per-fetch detail.
    Debug,
    /// Lifecycle events.
    #[default]
    Info,
    /// Failures.
    Warn,
    /// Errors only.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Top-level configuration, read from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file override from the command line.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Image loader settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Procedural generator settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// `[loader]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Automatic retries before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Minimum milliseconds between an attempt starting and its retry.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Distance from the viewport at which lazy images start loading.
    #[serde(default = "default_proximity_margin")]
    pub proximity_margin_px: f32,

    /// Defer loading until images approach the viewport.
    #[serde(default = "default_true")]
    pub enable_lazy_loading: bool,

    /// Show blurred placeholders while loading.
    #[serde(default = "default_true")]
    pub enable_progressive_loading: bool,

    /// HTTP request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Decoded network images kept in memory.
    #[serde(default = "default_memory_cache_size")]
    pub memory_cache_size: usize,
}

impl LoaderConfig {
    /// Retry delay as a duration.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// HTTP timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            proximity_margin_px: default_proximity_margin(),
            enable_lazy_loading: true,
            enable_progressive_loading: true,
            timeout_secs: default_timeout_secs(),
            memory_cache_size: default_memory_cache_size(),
        }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Forces monitoring on or off. Unset means on in debug builds only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl TelemetryConfig {
    /// Returns whether monitoring is on for this build.
    #[must_use]
    pub fn monitoring(&self) -> bool {
        self.enabled.unwrap_or(cfg!(debug_assertions))
    }
}

/// `[generator]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Rendered fallbacks kept in memory.
    #[serde(default = "default_generator_cache_size")]
    pub cache_size: usize,

    /// Default canvas width for `generate`.
    #[serde(default = "default_canvas_edge")]
    pub width: u32,

    /// Default canvas height for `generate`.
    #[serde(default = "default_canvas_edge")]
    pub height: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cache_size: default_generator_cache_size(),
            width: default_canvas_edge(),
            height: default_canvas_edge(),
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

const fn default_proximity_margin() -> f32 {
    50.0
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_memory_cache_size() -> usize {
    128
}

const fn default_generator_cache_size() -> usize {
    64
}

const fn default_canvas_edge() -> u32 {
    400
}

impl AppConfig {
    /// Applies command-line overrides.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(telemetry) = args.telemetry {
            self.telemetry.enabled = Some(telemetry);
        }
        if let Some(max_retries) = args.max_retries {
            self.loader.max_retries = max_retries;
        }
        if let Some(retry_delay_ms) = args.retry_delay_ms {
            self.loader.retry_delay_ms = retry_delay_ms;
        }
    }

    /// Per-user configuration directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Default log file location.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("artframe.log"))
    }

    /// Log file in effect: the override, else the default location.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::Info,
            loader: LoaderConfig::default(),
            telemetry: TelemetryConfig::default(),
            generator: GeneratorConfig::default(),
        }
    }
}
