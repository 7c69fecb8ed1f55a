//! Command handlers for the `artframe` binary.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, eyre};
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::application::services::procedural::{self, ProceduralArtworkGenerator};
use crate::application::services::variant_selector;
use crate::application::services::{
    ImageSourceResolver, LoaderEvent, LoaderOptions, RenderedArtwork, RetryingImageLoader,
    TelemetryAggregator,
};
use crate::domain::entities::{ArtworkImageRequest, ImageVariant, Seed, Style};
use crate::infrastructure::config::{AppConfig, Command, LoaderConfig};
use crate::infrastructure::image::{HttpFetcherConfig, HttpImageFetcher};

/// Entry marking an artwork without an image.
const NO_SOURCE: &str = "-";

/// Converts the `[loader]` section into loader options.
#[must_use]
pub fn loader_options(config: &LoaderConfig) -> LoaderOptions {
    LoaderOptions {
        max_retries: config.max_retries,
        retry_delay: config.retry_delay(),
        priority: false,
        lazy: config.enable_lazy_loading,
        progressive: config.enable_progressive_loading,
        margin: config.proximity_margin_px,
    }
}

/// Arguments of the `load` command.
struct LoadOptions<'a> {
    variant: ImageVariant,
    category: &'a str,
    priority: bool,
    json: bool,
    output_dir: Option<&'a Path>,
}

/// The wired pipeline plus the configuration it was built from.
pub struct App {
    config: AppConfig,
    fetcher: Arc<HttpImageFetcher>,
    generator: Arc<ProceduralArtworkGenerator>,
    telemetry: TelemetryAggregator,
    resolver: ImageSourceResolver,
}

impl App {
    /// Builds the pipeline.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: AppConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpImageFetcher::new(HttpFetcherConfig {
            timeout: config.loader.timeout(),
            memory_cache_size: config.loader.memory_cache_size,
        })?);
        let generator = Arc::new(ProceduralArtworkGenerator::new(config.generator.cache_size));
        let telemetry = TelemetryAggregator::new(config.telemetry.monitoring());

        let loader = RetryingImageLoader::new(
            loader_options(&config.loader),
            fetcher.clone(),
            telemetry.clone(),
        );
        let resolver = ImageSourceResolver::new(loader, generator.clone());

        Ok(Self {
            config,
            fetcher,
            generator,
            telemetry,
            resolver,
        })
    }

    /// Runs one command.
    ///
    /// # Errors
    /// Returns error if arguments are invalid or output cannot be written.
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Generate {
                title,
                category,
                style,
                width,
                height,
                output,
            } => self.generate(&title, &category, style.as_deref(), width, height, &output),
            Command::Load {
                variant,
                category,
                priority,
                json,
                output_dir,
                urls,
            } => {
                let options = LoadOptions {
                    variant,
                    category: &category,
                    priority,
                    json,
                    output_dir: output_dir.as_deref(),
                };
                self.load(&options, &urls).await
            }
            Command::Sizes {
                variant,
                url,
                aspect_ratio,
            } => {
                Self::sizes(variant, &url, aspect_ratio);
                Ok(())
            }
        }
    }

    fn generate(
        &self,
        title: &str,
        category: &str,
        style: Option<&str>,
        width: Option<u32>,
        height: Option<u32>,
        output: &Path,
    ) -> Result<()> {
        let style = match style {
            Some(name) => name.parse::<Style>()?,
            None => Style::from_category(category),
        };
        let seed = Seed::from_artwork(title, category);
        let width = width.unwrap_or(self.config.generator.width);
        let height = height.unwrap_or(self.config.generator.height);

        let image = self.generator.generate(&seed, width, height, style);
        let png = procedural::encode_png(&image).wrap_err("Failed to encode PNG")?;
        std::fs::write(output, png)
            .wrap_err_with(|| format!("Failed to write {}", output.display()))?;

        info!(seed = %seed, style = %style, path = %output.display(), "Generated artwork");
        println!(
            "Wrote {} ({}x{}, {style}, seed \"{seed}\")",
            output.display(),
            image.width(),
            image.height()
        );
        Ok(())
    }

    async fn load(&self, options: &LoadOptions<'_>, urls: &[String]) -> Result<()> {
        let requests: Vec<_> = urls
            .iter()
            .enumerate()
            .map(|(index, url)| {
                let request =
                    ArtworkImageRequest::new(format!("Artwork {}", index + 1), options.category)
                        .with_variant(options.variant)
                        .with_priority(options.priority);
                if url == NO_SOURCE {
                    request
                } else {
                    request.with_url(url.as_str())
                }
            })
            .collect();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let rendered = join_all(
            requests
                .iter()
                .map(|request| self.resolver.render(request, None, Some(events_tx.clone()))),
        )
        .await;
        drop(events_tx);

        while let Some(event) = events_rx.recv().await {
            match event {
                LoaderEvent::Failed(error) => println!("onError: {error}"),
                LoaderEvent::AttemptFailed(error) => debug!(error = %error, "Attempt failed"),
                LoaderEvent::Retrying { url, attempt } => debug!(url = %url, attempt, "Retry issued"),
                LoaderEvent::Loaded { url, load_time } => {
                    debug!(url = %url, ms = load_time.as_millis(), "onLoad");
                }
            }
        }

        for (request, artwork) in requests.iter().zip(&rendered) {
            println!("{}", describe(request, artwork));
        }

        if let Some(dir) = options.output_dir {
            tokio::fs::create_dir_all(dir).await?;
            for (index, artwork) in rendered.iter().enumerate() {
                let path = dir.join(format!("artwork-{}.png", index + 1));
                write_png(&path, artwork).await?;
            }
        }

        let metrics = self.telemetry.snapshot();
        match (self.telemetry.is_monitoring(), options.json) {
            (false, _) => println!("Telemetry disabled (pass --telemetry true to record)"),
            (true, true) => println!("{}", serde_json::to_string_pretty(&metrics)?),
            (true, false) => println!("{metrics}"),
        }
        println!("{}", self.fetcher.cache_stats());
        Ok(())
    }

    fn sizes(variant: ImageVariant, url: &str, aspect_ratio: Option<f32>) {
        let plan = variant_selector::plan(variant, url, aspect_ratio);

        println!("variant: {variant}");
        println!("src:     {}", plan.src);
        println!("sizes:   {}", plan.sizes);
        println!("srcset:  {}", plan.srcset);

        let default = plan.config.default;
        println!("  default: {}", dimensions(default.width, default.height, default.quality));
        for entry in &plan.config.breakpoints {
            let d = entry.dimensions;
            println!(
                "  {:>7} (>= {}px): {}",
                entry.breakpoint.name(),
                entry.breakpoint.min_width(),
                dimensions(d.width, d.height, d.quality)
            );
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

fn dimensions(width: u32, height: Option<u32>, quality: u8) -> String {
    height.map_or_else(
        || format!("{width}w q{quality}"),
        |height| format!("{width}x{height} q{quality}"),
    )
}

fn describe(request: &ArtworkImageRequest, artwork: &RenderedArtwork) -> String {
    let (width, height) = artwork.dimensions();
    match artwork {
        RenderedArtwork::Network { retries, .. } => format!(
            "{}: loaded {width}x{height} from {} ({retries} retries)",
            request.title,
            request.source_url().unwrap_or_default()
        ),
        RenderedArtwork::Procedural { style, reason, .. } => format!(
            "{}: procedural {style} {width}x{height} ({reason})",
            request.title
        ),
    }
}

async fn write_png(path: &Path, artwork: &RenderedArtwork) -> Result<()> {
    let bytes = match artwork {
        RenderedArtwork::Network { image, .. } => {
            let mut buffer = Cursor::new(Vec::new());
            image.write_to(&mut buffer, image::ImageFormat::Png)?;
            buffer.into_inner()
        }
        RenderedArtwork::Procedural { image, .. } => procedural::encode_png(image)?,
    };
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| eyre!("Failed to write {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ImageError;
    use std::time::Duration;

    #[test]
    fn test_loader_options_from_config() {
        let config = LoaderConfig {
            max_retries: 5,
            retry_delay_ms: 250,
            enable_lazy_loading: false,
            proximity_margin_px: 200.0,
            ..LoaderConfig::default()
        };
        let options = loader_options(&config);

        assert_eq!(options.max_retries, 5);
        assert_eq!(options.retry_delay, Duration::from_millis(250));
        assert!(!options.lazy);
        assert!(options.progressive);
        assert!(!options.priority);
        assert!((options.margin - 200.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dimensions_label() {
        assert_eq!(dimensions(640, None, 85), "640w q85");
        assert_eq!(dimensions(80, Some(80), 80), "80x80 q80");
    }

    #[tokio::test]
    async fn test_generate_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("art.png");
        let app = App::new(AppConfig::default()).unwrap();

        app.run(Command::Generate {
            title: "Sunset over Hills".to_string(),
            category: "abstract".to_string(),
            style: None,
            width: Some(64),
            height: Some(48),
            output: output.clone(),
        })
        .await
        .unwrap();

        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (64, 48));
    }

    #[tokio::test]
    async fn test_generate_rejects_unknown_style() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(AppConfig::default()).unwrap();

        let result = app
            .run(Command::Generate {
                title: "x".to_string(),
                category: "abstract".to_string(),
                style: Some("cubism".to_string()),
                width: None,
                height: None,
                output: dir.path().join("x.png"),
            })
            .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_describe_fallback() {
        let request = ArtworkImageRequest::new("Artwork 1", "painting");
        let artwork = RenderedArtwork::Procedural {
            image: Arc::new(image::RgbaImage::new(4, 3)),
            seed: request.seed(),
            style: Style::Painting,
            reason: ImageError::NoSource,
        };

        assert_eq!(
            describe(&request, &artwork),
            "Artwork 1: procedural painting 4x3 (no image source supplied)"
        );
    }
}
