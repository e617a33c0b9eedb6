use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

/// Source of "now" for a rolling counter, in nanoseconds since an arbitrary epoch
///
/// Readings must never go backwards for a given clock.
pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> u64;
}

/// Monotonic time source backed by `Instant`
///
/// The epoch is captured at construction, so every bucket boundary produced
/// from this source is relative to the moment the counter was created.
#[derive(Debug, Clone, Copy)]
pub struct TimeSource {
    /// Epoch for relative time measurements
    epoch: Instant,
}

impl TimeSource {
    /// Create a new time source with current time as epoch
    #[inline(always)]
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TimeSource {
    #[inline(always)]
    fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

/// Hand-driven clock for deterministic tests and simulations
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to the counter under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at a given reading
    pub fn starting_at(nanos: u64) -> Self {
        Self { nanos: Arc::new(AtomicU64::new(nanos)) }
    }

    pub fn set(&self, nanos: u64) {
        self.nanos.store(nanos, Ordering::Release);
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(duration_to_nanos(by), Ordering::AcqRel);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.nanos.fetch_add(millis_to_nanos(millis), Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_nanos(&self) -> u64 {
        self.nanos.load(Ordering::Acquire)
    }
}

/// Convert milliseconds to nanoseconds
#[inline(always)]
pub const fn millis_to_nanos(millis: u64) -> u64 {
    millis.saturating_mul(1_000_000)
}

/// Convert duration to nanoseconds
#[inline(always)]
pub fn duration_to_nanos(duration: Duration) -> u64 {
    duration.as_nanos() as u64
}
