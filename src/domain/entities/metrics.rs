//! Aggregated image-load telemetry.
//!
//! [`Metrics`] is a value: every change is computed by [`Metrics::reduce`] from
//! the previous value and one [`TelemetryEvent`], so completions that land in
//! the same tick are applied one after another instead of overwriting each
//! other.

use serde::Serialize;

/// One timed load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSample {
    /// URL that was loaded.
    pub url: String,
    /// Load time in milliseconds.
    pub time_ms: f64,
}

/// A lifecycle event reported by a loader.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    /// A new image entered the pipeline.
    Registered {
        /// Image URL.
        url: String,
    },
    /// An image finished loading.
    Loaded {
        /// Image URL.
        url: String,
        /// Load time in milliseconds.
        time_ms: f64,
    },
    /// An image failed for good.
    Failed {
        /// Image URL.
        url: String,
        /// Failure description.
        message: String,
    },
}

/// Session-wide load statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    /// Images registered with the pipeline.
    pub total_images: usize,
    /// Images that finished loading.
    pub loaded_images: usize,
    /// Images that failed after exhausting retries.
    pub failed_images: usize,
    /// Every recorded load time, in report order.
    pub load_times_ms: Vec<f64>,
    /// Mean of `load_times_ms`, or zero when empty.
    pub average_load_time_ms: f64,
    /// Slowest load seen so far.
    pub slowest: Option<LoadSample>,
    /// Fastest load seen so far.
    pub fastest: Option<LoadSample>,
    /// URLs of failed images, in report order.
    pub error_urls: Vec<String>,
}

impl Metrics {
    /// Returns the metrics that follow `self` after `event`.
    #[must_use]
    pub fn reduce(&self, event: &TelemetryEvent) -> Self {
        let mut next = self.clone();
        match event {
            TelemetryEvent::Registered { .. } => {
                next.total_images += 1;
            }
            TelemetryEvent::Loaded { url, time_ms } => {
                next.loaded_images += 1;
                next.load_times_ms.push(*time_ms);
                next.average_load_time_ms = mean(&next.load_times_ms);

                let sample = LoadSample {
                    url: url.clone(),
                    time_ms: *time_ms,
                };
                if next.slowest.as_ref().is_none_or(|s| *time_ms > s.time_ms) {
                    next.slowest = Some(sample.clone());
                }
                if next.fastest.as_ref().is_none_or(|f| *time_ms < f.time_ms) {
                    next.fastest = Some(sample);
                }
            }
            TelemetryEvent::Failed { url, .. } => {
                next.failed_images += 1;
                next.error_urls.push(url.clone());
            }
        }

        // Reports for images that were never registered still count.
        next.total_images = next
            .total_images
            .max(next.loaded_images + next.failed_images);
        next
    }

    /// Percentage of settled images that loaded, or `None` before any settled.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        let settled = self.loaded_images + self.failed_images;
        (settled > 0).then(|| self.loaded_images as f64 / settled as f64 * 100.0)
    }

    /// Images registered but not yet settled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.total_images
            .saturating_sub(self.loaded_images + self.failed_images)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Images: {} total, {} loaded, {} failed, {} in flight; avg {:.1}ms",
            self.total_images,
            self.loaded_images,
            self.failed_images,
            self.in_flight(),
            self.average_load_time_ms
        )?;
        if let Some(rate) = self.success_rate() {
            write!(f, ", {rate:.1}% success")?;
        }
        if let (Some(fastest), Some(slowest)) = (&self.fastest, &self.slowest) {
            write!(
                f,
                " (fastest {:.1}ms, slowest {:.1}ms)",
                fastest.time_ms, slowest.time_ms
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(url: &str, time_ms: f64) -> TelemetryEvent {
        TelemetryEvent::Loaded {
            url: url.to_string(),
            time_ms,
        }
    }

    fn registered(url: &str) -> TelemetryEvent {
        TelemetryEvent::Registered {
            url: url.to_string(),
        }
    }

    #[test]
    fn test_reduce_tracks_extremes_and_average() {
        let metrics = [
            registered("a"),
            registered("b"),
            registered("c"),
            loaded("a", 300.0),
            loaded("b", 100.0),
            loaded("c", 200.0),
        ]
        .iter()
        .fold(Metrics::default(), |acc, event| acc.reduce(event));

        assert_eq!(metrics.loaded_images, 3);
        assert!((metrics.average_load_time_ms - 200.0).abs() < f64::EPSILON);
        assert_eq!(metrics.slowest.as_ref().map(|s| s.url.as_str()), Some("a"));
        assert_eq!(metrics.fastest.as_ref().map(|s| s.url.as_str()), Some("b"));
    }

    #[test]
    fn test_reduce_does_not_mutate_previous() {
        let before = Metrics::default().reduce(&registered("a"));
        let after = before.reduce(&loaded("a", 50.0));

        assert_eq!(before.loaded_images, 0);
        assert_eq!(after.loaded_images, 1);
    }

    #[test]
    fn test_failure_records_url() {
        let metrics = Metrics::default().reduce(&registered("a")).reduce(&TelemetryEvent::Failed {
            url: "a".to_string(),
            message: "HTTP 404".to_string(),
        });

        assert_eq!(metrics.failed_images, 1);
        assert_eq!(metrics.error_urls, vec!["a".to_string()]);
        assert_eq!(metrics.success_rate(), Some(0.0));
    }

    #[test]
    fn test_unregistered_reports_keep_total_consistent() {
        let metrics = Metrics::default()
            .reduce(&loaded("a", 10.0))
            .reduce(&TelemetryEvent::Failed {
                url: "b".to_string(),
                message: "boom".to_string(),
            });

        assert_eq!(metrics.total_images, 2);
        assert_eq!(metrics.in_flight(), 0);
    }

    #[test]
    fn test_display_summary() {
        let metrics = Metrics::default().reduce(&loaded("a", 120.0));
        let text = metrics.to_string();
        assert!(text.contains("1 loaded"));
        assert!(text.contains("100.0% success"));
    }
}
