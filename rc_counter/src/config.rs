use std::time::Duration;

use serde::Deserialize;

use crate::error::CounterError;
use crate::error::Result;
use crate::rolling_counter::RollingCounter;
use crate::time::Clock;

/// Shape of a rolling counter, as read from a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RollingCounterConfig {
    /// Length of the trailing window in milliseconds
    pub window_ms: u64,

    /// Number of buckets the window is split into
    pub num_buckets: usize,
}

impl Default for RollingCounterConfig {
    fn default() -> Self {
        Self { window_ms: 1000, num_buckets: 10 }
    }
}

impl RollingCounterConfig {
    /// Check the configuration and return the bucket duration in milliseconds
    ///
    /// The duration is `window_ms / num_buckets`, truncated.
    pub fn validate(&self) -> Result<u64> {
        if self.num_buckets == 0 {
            return Err(CounterError::InvalidConfig("num_buckets must be greater than 0"));
        }
        if self.window_ms == 0 {
            return Err(CounterError::InvalidConfig("window_ms must be greater than 0"));
        }

        let bucket_ms = self.window_ms / self.num_buckets as u64;
        if bucket_ms == 0 {
            return Err(CounterError::InvalidConfig("window_ms is too short to give each bucket at least 1ms"));
        }

        Ok(bucket_ms)
    }

    /// Build a counter driven by the monotonic clock
    pub fn build(&self) -> Result<RollingCounter> {
        RollingCounter::new(self.window_ms, self.num_buckets)
    }

    /// Build a counter driven by the given clock
    pub fn build_with_clock<C: Clock>(&self, clock: C) -> Result<RollingCounter<C>> {
        RollingCounter::with_clock(self.window_ms, self.num_buckets, clock)
    }
}

/// Builder for configuring a rolling counter
pub struct RollingCounterBuilder {
    window: Option<Duration>,
    num_buckets: Option<usize>,
}

impl RollingCounterBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { window: None, num_buckets: None }
    }

    /// Set the trailing window duration, truncated to whole milliseconds
    pub fn window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// Set the trailing window in milliseconds
    pub fn window_ms(mut self, window_ms: u64) -> Self {
        self.window = Some(Duration::from_millis(window_ms));
        self
    }

    /// Set the number of buckets
    pub fn buckets(mut self, num_buckets: usize) -> Self {
        self.num_buckets = Some(num_buckets);
        self
    }

    /// Set window to 1 second
    pub fn per_second(self) -> Self {
        self.window(Duration::from_secs(1))
    }

    /// Set window to 1 minute
    pub fn per_minute(self) -> Self {
        self.window(Duration::from_secs(60))
    }

    fn config(&self) -> RollingCounterConfig {
        let defaults = RollingCounterConfig::default();
        RollingCounterConfig {
            window_ms: self.window.map_or(defaults.window_ms, |w| w.as_millis() as u64),
            num_buckets: self.num_buckets.unwrap_or(defaults.num_buckets),
        }
    }

    /// Build the rolling counter
    ///
    /// Unset fields fall back to `RollingCounterConfig::default()`.
    pub fn build(self) -> Result<RollingCounter> {
        self.config().build()
    }

    /// Build the rolling counter on a custom clock
    pub fn build_with_clock<C: Clock>(self, clock: C) -> Result<RollingCounter<C>> {
        self.config().build_with_clock(clock)
    }
}

impl Default for RollingCounterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
