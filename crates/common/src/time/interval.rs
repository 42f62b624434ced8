//! Recurring intervals with jitter support
//!
//! Provides utilities for creating recurring intervals with optional jitter.

use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, Instant, Interval as TokioInterval};

/// Configuration for an interval
#[derive(Debug, Clone)]
pub struct IntervalConfig {
    /// Base duration for the interval
    pub duration: Duration,

    /// Optional jitter factor (0.0 - 1.0)
    /// 0.0 = no jitter, 1.0 = up to 100% jitter
    pub jitter: Option<f64>,

    /// Whether to skip missed ticks
    pub skip_missed_ticks: bool,
}

impl IntervalConfig {
    /// Create a new interval configuration
    pub fn new(duration: Duration) -> Self {
        Self { duration, jitter: None, skip_missed_ticks: false }
    }

    /// Set the jitter factor (0.0 - 1.0)
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter.clamp(0.0, 1.0));
        self
    }

    /// Set whether to skip missed ticks
    pub fn skip_missed_ticks(mut self, skip: bool) -> Self {
        self.skip_missed_ticks = skip;
        self
    }
}

/// A recurring interval with optional jitter
pub struct Interval {
    config: IntervalConfig,
    inner: Option<TokioInterval>,
}

impl Interval {
    /// Create a new interval
    pub fn new(config: IntervalConfig) -> Self {
        let inner = if config.jitter.is_none() {
            let mut interval = tokio::time::interval(config.duration);
            if config.skip_missed_ticks {
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            }
            Some(interval)
        } else {
            None
        };

        Self { config, inner }
    }

    /// Create a simple interval without jitter
    pub fn simple(duration: Duration) -> Self {
        Self::new(IntervalConfig::new(duration))
    }

    /// Create an interval with jitter
    pub fn with_jitter(duration: Duration, jitter: f64) -> Self {
        Self::new(IntervalConfig::new(duration).with_jitter(jitter))
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) -> Instant {
        if let Some(ref mut inner) = self.inner {
            // No jitter - use tokio interval
            inner.tick().await
        } else {
            // With jitter - calculate next delay
            let base_duration = self.config.duration;
            let jitter_factor = self.config.jitter.unwrap_or(0.0);

            let jitter_range = base_duration.as_secs_f64() * jitter_factor;
            let jitter_offset = rand::thread_rng().gen_range(-jitter_range..jitter_range);
            let delay =
                Duration::from_secs_f64((base_duration.as_secs_f64() + jitter_offset).max(0.0));

            sleep(delay).await;
            Instant::now()
        }
    }

    /// Reset the interval to start immediately on the next tick
    pub fn reset(&mut self) {
        if let Some(ref mut inner) = self.inner {
            inner.reset();
        }
    }
}

/// Create a simple interval
pub fn interval(duration: Duration) -> Interval {
    Interval::simple(duration)
}

/// Create an interval with jitter
pub fn interval_with_jitter(duration: Duration, jitter: f64) -> Interval {
    Interval::with_jitter(duration, jitter)
}
