use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::app_config::LogLevel;
use crate::domain::entities::ImageVariant;

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "artframe",
    version,
    about = "Artwork image delivery: procedural fallbacks, retrying loads, responsive variants",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Record load telemetry.
    #[arg(long, value_name = "BOOL", global = true)]
    pub telemetry: Option<bool>,

    /// Automatic retries per image.
    #[arg(long, value_name = "N", global = true)]
    pub max_retries: Option<u32>,

    /// Minimum delay before an automatic retry, in milliseconds.
    #[arg(long, value_name = "MS", global = true)]
    pub retry_delay_ms: Option<u64>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render procedural artwork to a PNG file.
    Generate {
        /// Artwork title.
        #[arg(long)]
        title: String,

        /// Artwork category; picks the style unless `--style` is given.
        #[arg(long, default_value = "abstract")]
        category: String,

        /// Style override.
        #[arg(long)]
        style: Option<String>,

        /// Canvas width; defaults to the configured width.
        #[arg(long)]
        width: Option<u32>,

        /// Canvas height; defaults to the configured height.
        #[arg(long)]
        height: Option<u32>,

        /// Output PNG path.
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Resolve and load artwork images concurrently, then print telemetry.
    Load {
        /// Variant every image is requested as.
        #[arg(long, value_enum, default_value_t = ImageVariant::GalleryCard)]
        variant: ImageVariant,

        /// Category used for procedural fallbacks.
        #[arg(long, default_value = "mixed")]
        category: String,

        /// Load eagerly.
        #[arg(long)]
        priority: bool,

        /// Print telemetry as JSON.
        #[arg(long)]
        json: bool,

        /// Directory to write every resulting image to as PNG.
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Image URLs; an empty entry or `-` means the artwork has no image.
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// Print the `sizes` and `srcset` descriptors for a variant.
    Sizes {
        /// Variant to describe.
        #[arg(long, value_enum)]
        variant: ImageVariant,

        /// Image URL the descriptors point at.
        #[arg(long, default_value = "https://images.example.com/artwork.jpg")]
        url: String,

        /// Width / height ratio for variants without a fixed height.
        #[arg(long)]
        aspect_ratio: Option<f32>,
    },
}
