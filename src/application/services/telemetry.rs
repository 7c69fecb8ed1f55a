//! Shared image-load telemetry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::domain::entities::{Metrics, TelemetryEvent};

/// Cloneable handle to one session's load metrics.
///
/// Every clone reports into the same [`Metrics`]. Create a fresh aggregator
/// per session (or per test) instead of sharing one globally.
#[derive(Clone)]
pub struct TelemetryAggregator {
    inner: Arc<Inner>,
}

struct Inner {
    metrics: Mutex<Metrics>,
    monitoring: AtomicBool,
}

impl TelemetryAggregator {
    /// Creates an aggregator with monitoring switched on or off.
    #[must_use]
    pub fn new(monitoring: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                metrics: Mutex::new(Metrics::default()),
                monitoring: AtomicBool::new(monitoring),
            }),
        }
    }

    /// Creates an aggregator that monitors in debug builds only.
    #[must_use]
    pub fn for_build() -> Self {
        Self::new(cfg!(debug_assertions))
    }

    /// Returns true if reports are being recorded.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.inner.monitoring.load(Ordering::Acquire)
    }

    /// Switches recording on or off. Already recorded metrics are kept.
    pub fn set_monitoring(&self, enabled: bool) {
        self.inner.monitoring.store(enabled, Ordering::Release);
    }

    /// Counts a new image entering the pipeline.
    pub fn register_image(&self, url: &str) {
        self.dispatch(TelemetryEvent::Registered {
            url: url.to_string(),
        });
    }

    /// Records a successful load.
    pub fn track_image_load(&self, url: &str, load_time: Duration) {
        self.dispatch(TelemetryEvent::Loaded {
            url: url.to_string(),
            time_ms: load_time.as_secs_f64() * 1000.0,
        });
    }

    /// Records a terminal failure.
    pub fn track_image_error(&self, url: &str, message: &str) {
        if self.is_monitoring() {
            warn!(url = %url, error = %message, "Image failed to load");
        }
        self.dispatch(TelemetryEvent::Failed {
            url: url.to_string(),
            message: message.to_string(),
        });
    }

    /// Clears all metrics back to zero.
    pub fn reset(&self) {
        *self.inner.metrics.lock() = Metrics::default();
        debug!("Image telemetry reset");
    }

    /// Returns a copy of the current metrics.
    #[must_use]
    pub fn snapshot(&self) -> Metrics {
        self.inner.metrics.lock().clone()
    }

    fn dispatch(&self, event: TelemetryEvent) {
        if !self.is_monitoring() {
            return;
        }
        let mut metrics = self.inner.metrics.lock();
        *metrics = metrics.reduce(&event);
        trace!(?event, total = metrics.total_images, "Telemetry updated");
    }
}

impl Default for TelemetryAggregator {
    fn default() -> Self {
        Self::for_build()
    }
}

impl std::fmt::Debug for TelemetryAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryAggregator")
            .field("monitoring", &self.is_monitoring())
            .field("metrics", &*self.inner.metrics.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_disabled_aggregator_ignores_reports() {
        let telemetry = TelemetryAggregator::new(false);
        telemetry.register_image("a");
        telemetry.track_image_load("a", ms(10));
        telemetry.track_image_error("b", "HTTP 404");

        assert_eq!(telemetry.snapshot(), Metrics::default());
    }

    #[test]
    fn test_clones_share_metrics() {
        let telemetry = TelemetryAggregator::new(true);
        let other = telemetry.clone();

        telemetry.register_image("a");
        other.track_image_load("a", ms(250));

        let metrics = telemetry.snapshot();
        assert_eq!(metrics.total_images, 1);
        assert_eq!(metrics.loaded_images, 1);
        assert!((metrics.average_load_time_ms - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let telemetry = TelemetryAggregator::new(true);
        telemetry.register_image("a");
        telemetry.register_image("b");
        telemetry.track_image_load("a", ms(100));
        telemetry.track_image_error("b", "timeout");

        telemetry.reset();
        assert_eq!(telemetry.snapshot(), Metrics::default());
    }

    #[test]
    fn test_isolated_instances() {
        let a = TelemetryAggregator::new(true);
        let b = TelemetryAggregator::new(true);
        a.register_image("x");
        assert_eq!(b.snapshot().total_images, 0);
    }

    #[test]
    fn test_concurrent_reports_are_not_lost() {
        let telemetry = TelemetryAggregator::new(true);
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let telemetry = telemetry.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let url = format!("https://img/{worker}/{i}.jpg");
                        telemetry.register_image(&url);
                        if i % 10 == 0 {
                            telemetry.track_image_error(&url, "HTTP 500");
                        } else {
                            telemetry.track_image_load(&url, ms(i));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = telemetry.snapshot();
        assert_eq!(metrics.total_images, 800);
        assert_eq!(metrics.loaded_images, 720);
        assert_eq!(metrics.failed_images, 80);
        assert_eq!(metrics.load_times_ms.len(), 720);
        assert!(metrics.total_images >= metrics.loaded_images + metrics.failed_images);

        let mean = metrics.load_times_ms.iter().sum::<f64>() / 720.0;
        assert!((metrics.average_load_time_ms - mean).abs() < 1e-9);
    }

    #[test]
    fn test_monitoring_toggle() {
        let telemetry = TelemetryAggregator::new(false);
        telemetry.set_monitoring(true);
        telemetry.register_image("a");
        assert!(telemetry.is_monitoring());
        assert_eq!(telemetry.snapshot().total_images, 1);
    }
}
