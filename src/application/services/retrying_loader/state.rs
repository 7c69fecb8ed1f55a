//! Per-image load state machine.
//!
//! ```text
//! Idle -> Loading -> Loaded
//!            |
//!            +-> (wait) -> Retrying -> Loaded
//!            |                |
//!            +----------------+-> Error -> (manual) -> Retrying
//! ```
//!
//! Time is passed in explicitly so the machine stays synchronous; the async
//! driver in the parent module owns the clock, the fetch and the timers.

use std::time::Duration;

use tokio::time::Instant;

use crate::domain::entities::LoadPhase;
use crate::domain::url_params::cache_busted;

/// Default number of automatic retries.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default minimum time between a load starting and its automatic retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Automatic retry limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Automatic retries allowed before giving up.
    pub max_retries: u32,
    /// Minimum time since the load started before retrying.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Outcome of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Retry automatically once the delay has passed.
    RetryAfter(Duration),
    /// No automatic retries left; the state is now `Error`.
    Exhausted,
}

/// Load state owned by one mounted image.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadState {
    phase: LoadPhase,
    retry_count: u32,
    source: String,
    current_src: String,
    load_started_at: Instant,
}

impl LoadState {
    /// Creates the state for `src`, loading immediately when `eager`.
    #[must_use]
    pub fn new(src: impl Into<String>, eager: bool, now: Instant) -> Self {
        let source = src.into();
        Self {
            phase: if eager {
                LoadPhase::Loading
            } else {
                LoadPhase::Idle
            },
            retry_count: 0,
            current_src: source.clone(),
            source,
            load_started_at: now,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// True while a fetch is in flight (including a just-issued retry).
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    /// True once retries are exhausted.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        matches!(self.phase, LoadPhase::Error)
    }

    /// True while the in-flight fetch is a retry.
    #[must_use]
    pub const fn is_retrying(&self) -> bool {
        matches!(self.phase, LoadPhase::Retrying)
    }

    /// Retries issued so far, automatic and manual.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// URL as originally requested.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// URL of the current attempt, cache-busted after a retry.
    #[must_use]
    pub fn current_src(&self) -> &str {
        &self.current_src
    }

    /// When the current attempt started.
    #[must_use]
    pub const fn load_started_at(&self) -> Instant {
        self.load_started_at
    }

    /// Starts (or restarts the clock of) a first attempt.
    ///
    /// Only applies before the first attempt settles or retries.
    pub fn start(&mut self, now: Instant) -> bool {
        match self.phase {
            LoadPhase::Idle | LoadPhase::Loading => {
                self.phase = LoadPhase::Loading;
                self.load_started_at = now;
                true
            }
            _ => false,
        }
    }

    /// Marks the in-flight attempt as loaded and returns its load time.
    pub fn succeed(&mut self, now: Instant) -> Option<Duration> {
        if !self.is_loading() {
            return None;
        }
        self.phase = LoadPhase::Loaded;
        Some(now.saturating_duration_since(self.load_started_at))
    }

    /// Records a failed attempt.
    pub fn fail(&mut self, now: Instant, policy: RetryPolicy) -> Failure {
        if self.retry_count < policy.max_retries {
            let elapsed = now.saturating_duration_since(self.load_started_at);
            Failure::RetryAfter(policy.retry_delay.saturating_sub(elapsed))
        } else {
            self.phase = LoadPhase::Error;
            Failure::Exhausted
        }
    }

    /// Issues an automatic retry and returns the URL to fetch.
    pub fn begin_retry(&mut self, now: Instant, timestamp_ms: i64) -> &str {
        self.retry(now, timestamp_ms);
        &self.current_src
    }

    /// Issues a manual retry from `Error`. Not bounded by the retry policy.
    ///
    /// Returns false if the image is not in the `Error` phase.
    pub fn manual_retry(&mut self, now: Instant, timestamp_ms: i64) -> bool {
        if !self.has_error() {
            return false;
        }
        self.retry(now, timestamp_ms);
        true
    }

    fn retry(&mut self, now: Instant, timestamp_ms: i64) {
        self.retry_count += 1;
        self.current_src = cache_busted(&self.source, self.retry_count, timestamp_ms);
        self.phase = LoadPhase::Retrying;
        self.load_started_at = now;
    }
}
