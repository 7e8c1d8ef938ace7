//! Tick rate estimation from recent tick durations.
//!
//! Keeps a fixed ring of the last `window` tick durations. The estimate is
//! the inverse of the mean duration of the recorded (non-zero) samples,
//! capped at the nominal rate. With no samples the server is assumed
//! healthy.

use std::time::{Duration, Instant};

/// Nominal ticks per second of the host loop.
pub const NOMINAL_TPS: f64 = 20.0;

/// Default number of tick durations kept.
pub const DEFAULT_TPS_WINDOW: usize = 100;

/// Sliding-window ticks-per-second estimator.
///
/// # Usage
///
/// ```
/// use warashi::control::TickRateEstimator;
/// use std::time::Duration;
///
/// let mut estimator = TickRateEstimator::new(100);
/// assert_eq!(estimator.estimate(), 20.0);
///
/// // 100ms ticks -> 10 TPS
/// for _ in 0..10 {
///     estimator.record_duration(Duration::from_millis(100));
/// }
/// assert!((estimator.estimate() - 10.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct TickRateEstimator {
    /// Ring of tick durations in nanoseconds; zero marks an empty slot.
    samples: Vec<u64>,
    /// Next slot to overwrite.
    next: usize,
    /// Start of the tick in progress.
    tick_started: Option<Instant>,
}

impl TickRateEstimator {
    /// Create an estimator keeping `window` samples (at least one).
    pub fn new(window: usize) -> Self {
        Self {
            samples: vec![0; window.max(1)],
            next: 0,
            tick_started: None,
        }
    }

    /// Create an estimator with the default window.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_TPS_WINDOW)
    }

    /// Mark the start of a host tick.
    pub fn on_tick_start(&mut self) {
        self.tick_started = Some(Instant::now());
    }

    /// Mark the end of a host tick and record its duration.
    ///
    /// Ignored when no tick start was recorded.
    pub fn on_tick_end(&mut self) {
        if let Some(started) = self.tick_started.take() {
            self.record_duration(started.elapsed());
        }
    }

    /// Record one tick duration, overwriting the oldest sample.
    pub fn record_duration(&mut self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.samples[self.next] = nanos;
        self.next = (self.next + 1) % self.samples.len();
    }

    /// Current ticks-per-second estimate, never above [`NOMINAL_TPS`].
    pub fn estimate(&self) -> f64 {
        let (sum, count) = self
            .samples
            .iter()
            .filter(|&&nanos| nanos > 0)
            .fold((0u128, 0u32), |(sum, count), &nanos| {
                (sum + nanos as u128, count + 1)
            });
        if count == 0 {
            return NOMINAL_TPS;
        }
        let avg_ms = (sum as f64 / count as f64) / 1_000_000.0;
        if avg_ms <= 0.0 {
            return NOMINAL_TPS;
        }
        (1000.0 / avg_ms).min(NOMINAL_TPS)
    }

    /// Number of recorded samples in the window.
    pub fn sample_count(&self) -> usize {
        self.samples.iter().filter(|&&nanos| nanos > 0).count()
    }

    /// Window size.
    pub fn window(&self) -> usize {
        self.samples.len()
    }

    /// Drop all samples.
    pub fn reset(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0);
        self.next = 0;
        self.tick_started = None;
    }
}

impl Default for TickRateEstimator {
    fn default() -> Self {
        Self::with_defaults()
    }
}
