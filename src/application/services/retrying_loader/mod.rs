//! Lazy, retrying image loader.
//!
//! [`RetryingImageLoader::mount`] spawns one task per image. The task waits
//! for the image to approach the viewport, fetches it, retries with a
//! cache-busted URL on failure and reports to telemetry. The returned
//! [`LoaderHandle`] exposes the state, accepts manual retries and cancels
//! the task (observation and pending retry timer included) on unmount.

mod state;

pub use state::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, Failure, LoadState, RetryPolicy};

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::progressive::ImageFrame;
use super::proximity::{DEFAULT_MARGIN, ProximityObserver, ViewportTracker};
use super::telemetry::TelemetryAggregator;
use crate::domain::entities::Rect;
use crate::domain::errors::ImageError;
use crate::domain::ports::{FetchError, ImageFetchPort};

/// Per-image loader settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoaderOptions {
    /// Automatic retries before giving up.
    pub max_retries: u32,
    /// Minimum time between an attempt starting and its retry.
    pub retry_delay: Duration,
    /// Load immediately regardless of viewport position.
    pub priority: bool,
    /// Defer loading until the image nears the viewport.
    pub lazy: bool,
    /// Show a placeholder while loading.
    pub progressive: bool,
    /// Proximity margin in CSS pixels.
    pub margin: f32,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            priority: false,
            lazy: true,
            progressive: true,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl LoaderOptions {
    /// Returns the automatic retry policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
        }
    }

    /// Returns true if a load should start without waiting for proximity.
    #[must_use]
    pub const fn is_eager(&self, observed: bool) -> bool {
        self.priority || !self.lazy || !observed
    }
}

/// Commands accepted by a mounted loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderCommand {
    /// Retry from the error state.
    Retry,
}

/// Notifications emitted by a mounted loader.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    /// The image loaded.
    Loaded {
        /// Original URL.
        url: String,
        /// Time from attempt start to completion.
        load_time: Duration,
    },
    /// An attempt failed and an automatic retry is pending.
    AttemptFailed(ImageError),
    /// A retry was issued.
    Retrying {
        /// Cache-busted URL of the new attempt.
        url: String,
        /// Retry number, starting at one.
        attempt: u32,
    },
    /// Automatic retries are exhausted.
    Failed(ImageError),
}

/// Observable state of one mounted image.
#[derive(Debug, Clone)]
pub struct LoaderSnapshot {
    /// Load state machine.
    pub state: LoadState,
    /// Decoded image once loaded.
    pub image: Option<Arc<DynamicImage>>,
    /// Most recent fetch failure.
    pub last_error: Option<FetchError>,
    progressive: bool,
}

impl LoaderSnapshot {
    /// Returns what to draw for this state.
    #[must_use]
    pub fn frame(&self) -> ImageFrame {
        ImageFrame::for_phase(
            self.state.phase(),
            self.state.retry_count(),
            self.progressive,
        )
    }
}

/// Spawns loader tasks that share one fetcher and telemetry sink.
#[derive(Clone)]
pub struct RetryingImageLoader {
    options: LoaderOptions,
    fetcher: Arc<dyn ImageFetchPort>,
    telemetry: TelemetryAggregator,
}

impl RetryingImageLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new(
        options: LoaderOptions,
        fetcher: Arc<dyn ImageFetchPort>,
        telemetry: TelemetryAggregator,
    ) -> Self {
        Self {
            options,
            fetcher,
            telemetry,
        }
    }

    /// Returns the loader settings.
    #[must_use]
    pub const fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Returns a loader that also loads eagerly when `priority` is set.
    #[must_use]
    pub fn with_priority(&self, priority: bool) -> Self {
        let mut loader = self.clone();
        loader.options.priority |= priority;
        loader
    }

    /// Returns the telemetry sink.
    #[must_use]
    pub const fn telemetry(&self) -> &TelemetryAggregator {
        &self.telemetry
    }

    /// Mounts an image and starts its loader task.
    ///
    /// `placement` is the tracker and the element's page rectangle; a lazy
    /// image starts once the element is within the configured margin of the
    /// viewport. Without a placement a lazy image loads straight away.
    #[must_use]
    pub fn mount(
        &self,
        src: &str,
        placement: Option<(&ViewportTracker, Rect)>,
        events: Option<mpsc::UnboundedSender<LoaderEvent>>,
    ) -> LoaderHandle {
        let eager = self.options.is_eager(placement.is_some());
        let state = LoadState::new(src, eager, Instant::now());
        let (snapshot_tx, snapshot_rx) = watch::channel(LoaderSnapshot {
            state: state.clone(),
            image: None,
            last_error: None,
            progressive: self.options.progressive,
        });
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            options: self.options,
            fetcher: Arc::clone(&self.fetcher),
            telemetry: self.telemetry.clone(),
            snapshot: snapshot_tx,
            commands: command_rx,
            events,
        };
        let observer = placement
            .filter(|_| !eager)
            .map(|(tracker, element)| tracker.observe(element, self.options.margin));
        let task = tokio::spawn(driver.run(state, observer));

        LoaderHandle {
            snapshot: snapshot_rx,
            commands: command_tx,
            task,
        }
    }
}

impl std::fmt::Debug for RetryingImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingImageLoader")
            .field("options", &self.options)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

/// Handle to one mounted image. Dropping it cancels the loader task.
#[derive(Debug)]
pub struct LoaderHandle {
    snapshot: watch::Receiver<LoaderSnapshot>,
    commands: mpsc::UnboundedSender<LoaderCommand>,
    task: JoinHandle<()>,
}

impl LoaderHandle {
    /// Returns the current state.
    #[must_use]
    pub fn snapshot(&self) -> LoaderSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Returns a receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot> {
        self.snapshot.clone()
    }

    /// Requests a manual retry. Returns false unless the image is in error.
    pub fn retry(&self) -> bool {
        self.snapshot.borrow().state.has_error() && self.commands.send(LoaderCommand::Retry).is_ok()
    }

    /// Waits until the image has loaded or given up.
    pub async fn settled(&mut self) -> LoaderSnapshot {
        let settled = self
            .snapshot
            .wait_for(|snapshot| snapshot.state.phase().is_settled())
            .await
            .map(|snapshot| (*snapshot).clone());
        settled.unwrap_or_else(|_| self.snapshot.borrow().clone())
    }

    /// Cancels the loader task and waits for it to release its resources.
    pub async fn unmount(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
        debug!("Image unmounted");
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Driver {
    options: LoaderOptions,
    fetcher: Arc<dyn ImageFetchPort>,
    telemetry: TelemetryAggregator,
    snapshot: watch::Sender<LoaderSnapshot>,
    commands: mpsc::UnboundedReceiver<LoaderCommand>,
    events: Option<mpsc::UnboundedSender<LoaderEvent>>,
}

impl Driver {
    async fn run(mut self, mut state: LoadState, observer: Option<ProximityObserver>) {
        self.telemetry.register_image(state.source());

        if let Some(mut observer) = observer {
            if !observer.wait_until_near().await {
                debug!(url = %state.source(), "Viewport closed before image came into range");
                return;
            }
            // One trigger is enough.
            drop(observer);
            state.start(Instant::now());
            self.publish(&state, None);
        }

        loop {
            let url = state.current_src().to_string();
            debug!(url = %url, retry = state.retry_count(), "Fetching image");

            match self.fetcher.fetch(&url).await {
                Ok(image) => {
                    if let Some(load_time) = state.succeed(Instant::now()) {
                        self.telemetry.track_image_load(state.source(), load_time);
                        info!(
                            url = %state.source(),
                            ms = load_time.as_millis(),
                            retries = state.retry_count(),
                            "Image loaded"
                        );
                        self.emit(LoaderEvent::Loaded {
                            url: state.source().to_string(),
                            load_time,
                        });
                    }
                    self.snapshot.send_modify(|snapshot| {
                        snapshot.state = state.clone();
                        snapshot.image = Some(image);
                        snapshot.last_error = None;
                    });
                    return;
                }
                Err(error) => match state.fail(Instant::now(), self.options.policy()) {
                    Failure::RetryAfter(wait) => {
                        debug!(url = %url, error = %error, wait_ms = wait.as_millis(), "Image load failed, retrying");
                        self.emit(LoaderEvent::AttemptFailed(ImageError::load_failed(
                            url.as_str(),
                            error.to_string(),
                        )));
                        self.publish(&state, Some(error));
                        tokio::time::sleep(wait).await;

                        let url = state.begin_retry(Instant::now(), timestamp_ms()).to_string();
                        self.publish(&state, None);
                        self.emit(LoaderEvent::Retrying {
                            url,
                            attempt: state.retry_count(),
                        });
                    }
                    Failure::Exhausted => {
                        let failure = ImageError::retry_exhausted(
                            state.source(),
                            state.retry_count(),
                            error.to_string(),
                        );
                        self.telemetry
                            .track_image_error(state.source(), &error.to_string());
                        warn!(url = %state.source(), retries = state.retry_count(), error = %error, "Giving up on image");
                        // Commands sent before this point targeted an earlier state.
                        while self.commands.try_recv().is_ok() {}
                        self.publish(&state, Some(error));
                        self.emit(LoaderEvent::Failed(failure));

                        if !self.await_manual_retry(&mut state).await {
                            return;
                        }
                    }
                },
            }
        }
    }

    /// Parks in the error state until a retry command arrives.
    ///
    /// Returns false once every handle is gone.
    async fn await_manual_retry(&mut self, state: &mut LoadState) -> bool {
        while let Some(command) = self.commands.recv().await {
            match command {
                LoaderCommand::Retry => {
                    if state.manual_retry(Instant::now(), timestamp_ms()) {
                        info!(url = %state.source(), attempt = state.retry_count(), "Manual retry");
                        self.publish(state, None);
                        self.emit(LoaderEvent::Retrying {
                            url: state.current_src().to_string(),
                            attempt: state.retry_count(),
                        });
                        return true;
                    }
                }
            }
        }
        false
    }

    fn publish(&self, state: &LoadState, error: Option<FetchError>) {
        self.snapshot.send_modify(|snapshot| {
            snapshot.state = state.clone();
            if error.is_some() {
                snapshot.last_error = error;
            }
        });
    }

    fn emit(&self, event: LoaderEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::LoadPhase;
    use crate::domain::ports::FetchResult;
    use crate::domain::ports::mocks::MockImageFetchPort;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Fetcher that replays a fixed script, each step taking `latency`.
    struct ScriptedFetcher {
        script: Mutex<VecDeque<bool>>,
        latency: Duration,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(script: &[bool], latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.iter().copied().collect()),
                latency,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    #[async_trait::async_trait]
    impl ImageFetchPort for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> FetchResult<Arc<DynamicImage>> {
            self.requests.lock().push(url.to_string());
            tokio::time::sleep(self.latency).await;
            let succeed = self.script.lock().pop_front().unwrap_or(false);
            if succeed {
                Ok(Arc::new(DynamicImage::new_rgba8(4, 4)))
            } else {
                Err(FetchError::HttpStatus {
                    status: 503,
                    reason: "Service Unavailable".to_string(),
                })
            }
        }
    }

    fn loader(options: LoaderOptions, fetcher: Arc<dyn ImageFetchPort>) -> RetryingImageLoader {
        RetryingImageLoader::new(options, fetcher, TelemetryAggregator::new(true))
    }

    fn eager(max_retries: u32) -> LoaderOptions {
        LoaderOptions {
            max_retries,
            lazy: false,
            ..LoaderOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let mut fetcher = MockImageFetchPort::new();
        fetcher.expect_fetch().times(3).returning(|_| {
            Err(FetchError::HttpStatus {
                status: 500,
                reason: "Internal Server Error".to_string(),
            })
        });
        let loader = loader(eager(2), Arc::new(fetcher));
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        let mut handle = loader.mount("https://img.test/a.jpg", None, Some(events_tx));
        let snapshot = handle.settled().await;

        assert!(snapshot.state.has_error());
        assert!(!snapshot.state.is_loading());
        assert_eq!(snapshot.state.retry_count(), 2);
        assert!(snapshot.frame().error.is_some());

        let metrics = loader.telemetry().snapshot();
        assert_eq!(metrics.failed_images, 1);
        assert_eq!(metrics.error_urls, vec!["https://img.test/a.jpg".to_string()]);

        let mut retries = 0;
        let mut attempt_failures = 0;
        let mut failed = false;
        while let Ok(event) = events_rx.try_recv() {
            match event {
                LoaderEvent::Retrying { .. } => retries += 1,
                LoaderEvent::AttemptFailed(error) => {
                    assert!(error.is_recoverable());
                    attempt_failures += 1;
                }
                LoaderEvent::Failed(error) => failed = !error.is_recoverable(),
                LoaderEvent::Loaded { .. } => panic!("unexpected load"),
            }
        }
        assert_eq!(retries, 2);
        assert_eq!(attempt_failures, 2);
        assert!(failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_uses_cache_busted_url_and_waits_for_delay() {
        let fetcher = ScriptedFetcher::new(&[false, true], Duration::from_millis(200));
        let loader = loader(eager(2), fetcher.clone());

        let start = Instant::now();
        let mut handle = loader.mount("https://img.test/b.jpg?w=400", None, None);
        let snapshot = handle.settled().await;

        assert_eq!(snapshot.state.phase(), LoadPhase::Loaded);
        assert!(snapshot.image.is_some());
        // 200ms fail, 800ms remaining delay, 200ms success.
        assert!(start.elapsed() >= Duration::from_millis(1200));

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], "https://img.test/b.jpg?w=400");
        assert!(requests[1].starts_with("https://img.test/b.jpg?w=400&retry=1&t="));

        let metrics = loader.telemetry().snapshot();
        assert_eq!(metrics.loaded_images, 1);
        assert_eq!(
            metrics.slowest.map(|s| s.url),
            Some("https://img.test/b.jpg?w=400".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_load_starts_when_near_viewport() {
        let tracker = ViewportTracker::new(Rect::new(0.0, 0.0, 1280.0, 800.0));
        let element = Rect::new(0.0, 3000.0, 400.0, 300.0);
        let fetcher = ScriptedFetcher::new(&[true], Duration::from_millis(1200));
        let loader = loader(LoaderOptions::default(), fetcher.clone());

        let mut handle = loader.mount("https://img.test/c.jpg", Some((&tracker, element)), None);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.snapshot().state.phase(), LoadPhase::Idle);
        assert!(fetcher.requests().is_empty());

        tracker.scroll_to(Rect::new(0.0, 2300.0, 1280.0, 800.0));
        let snapshot = handle.settled().await;

        assert_eq!(snapshot.state.phase(), LoadPhase::Loaded);
        assert_eq!(tracker.observers(), 0);

        let metrics = loader.telemetry().snapshot();
        assert_eq!(metrics.loaded_images, 1);
        let time_ms = metrics.fastest.map(|s| s.time_ms).unwrap_or_default();
        assert!((time_ms - 1200.0).abs() < 5.0, "load time was {time_ms}ms");
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_ignores_observer() {
        let tracker = ViewportTracker::new(Rect::new(0.0, 0.0, 1280.0, 800.0));
        let fetcher = ScriptedFetcher::new(&[true], Duration::from_millis(10));
        let options = LoaderOptions {
            priority: true,
            ..LoaderOptions::default()
        };
        let loader = loader(options, fetcher.clone());

        let element = Rect::new(0.0, 9000.0, 10.0, 10.0);
        let mut handle = loader.mount("https://img.test/hero.jpg", Some((&tracker, element)), None);

        assert!(handle.snapshot().state.is_loading());
        assert_eq!(tracker.observers(), 0);
        assert_eq!(handle.settled().await.state.phase(), LoadPhase::Loaded);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_retry_from_error() {
        let fetcher = ScriptedFetcher::new(&[false, true], Duration::from_millis(50));
        let loader = loader(eager(0), fetcher.clone());

        let mut handle = loader.mount("https://img.test/d.jpg", None, None);
        assert!(handle.settled().await.state.has_error());
        assert_eq!(loader.telemetry().snapshot().failed_images, 1);

        assert!(handle.retry());
        let mut updates = handle.subscribe();
        let snapshot = updates
            .wait_for(|s| s.state.phase() == LoadPhase::Loaded)
            .await
            .map(|s| (*s).clone())
            .unwrap();

        assert_eq!(snapshot.state.retry_count(), 1);
        assert!(fetcher.requests()[1].contains("retry=1"));
        assert_eq!(loader.telemetry().snapshot().loaded_images, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_ignored_while_loading() {
        let fetcher = ScriptedFetcher::new(&[true], Duration::from_secs(1));
        let loader = loader(eager(2), fetcher);

        let handle = loader.mount("https://img.test/e.jpg", None, None);
        assert!(!handle.retry());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_releases_observer() {
        let tracker = ViewportTracker::new(Rect::new(0.0, 0.0, 1280.0, 800.0));
        let fetcher = ScriptedFetcher::new(&[true], Duration::from_millis(10));
        let loader = loader(LoaderOptions::default(), fetcher.clone());

        let element = Rect::new(0.0, 4000.0, 10.0, 10.0);
        let handle = loader.mount("https://img.test/f.jpg", Some((&tracker, element)), None);
        assert_eq!(tracker.observers(), 1);

        handle.unmount().await;
        assert_eq!(tracker.observers(), 0);

        tracker.scroll_to(Rect::new(0.0, 3600.0, 1280.0, 800.0));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_pending_retry() {
        let fetcher = ScriptedFetcher::new(&[], Duration::from_millis(10));
        let options = LoaderOptions {
            retry_delay: Duration::from_secs(10),
            ..eager(2)
        };
        let loader = loader(options, fetcher.clone());

        let handle = loader.mount("https://img.test/g.jpg", None, None);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetcher.requests().len(), 1);

        handle.unmount().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fetcher.requests().len(), 1);
        assert_eq!(loader.telemetry().snapshot().failed_images, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_without_placement_loads_eagerly() {
        let fetcher = ScriptedFetcher::new(&[true], Duration::from_millis(10));
        let loader = loader(LoaderOptions::default(), fetcher);

        let mut handle = loader.mount("https://img.test/h.jpg", None, None);
        assert_eq!(handle.settled().await.state.phase(), LoadPhase::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_margin_sets_lazy_trigger() {
        // Element top at 1000, viewport bottom at 800: 200px away.
        let element = Rect::new(0.0, 1000.0, 400.0, 300.0);
        let wide = LoaderOptions {
            margin: 250.0,
            ..LoaderOptions::default()
        };

        let tracker = ViewportTracker::new(Rect::new(0.0, 0.0, 1280.0, 800.0));
        let fetcher = ScriptedFetcher::new(&[true], Duration::from_millis(10));
        let near = loader(wide, fetcher.clone());
        let mut handle = near.mount("https://img.test/near.jpg", Some((&tracker, element)), None);
        assert_eq!(handle.settled().await.state.phase(), LoadPhase::Loaded);
        assert_eq!(fetcher.requests().len(), 1);

        let fetcher = ScriptedFetcher::new(&[true], Duration::from_millis(10));
        let narrow = loader(LoaderOptions::default(), fetcher.clone());
        let handle = narrow.mount("https://img.test/far.jpg", Some((&tracker, element)), None);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.snapshot().state.phase(), LoadPhase::Idle);
        assert!(fetcher.requests().is_empty());

        // Scrolling 180px leaves a 20px gap, inside the default margin.
        tracker.scroll_to(Rect::new(0.0, 180.0, 1280.0, 800.0));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_retry_sent_as_soon_as_error_shows_is_kept() {
        for round in 0..200 {
            let fetcher = ScriptedFetcher::new(&[false, true], Duration::ZERO);
            let loader = loader(eager(0), fetcher);
            let handle = loader.mount("https://img.test/race.jpg", None, None);
            let mut updates = handle.subscribe();

            let retrier = std::thread::spawn(move || {
                while !handle.snapshot().state.has_error() {
                    std::hint::spin_loop();
                }
                assert!(handle.retry());
                handle
            });

            let loaded = tokio::time::timeout(
                Duration::from_secs(2),
                updates.wait_for(|s| s.state.phase() == LoadPhase::Loaded),
            )
            .await
            .is_ok_and(|result| result.is_ok());
            let _handle = retrier.join().unwrap();
            assert!(loaded, "manual retry dropped in round {round}");
        }
    }
}
