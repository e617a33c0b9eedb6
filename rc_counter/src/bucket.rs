/// One fixed-duration slice of the rolling window
///
/// Covers the half-open interval `[window_start, window_end)` in clock
/// nanoseconds. The interval never changes after creation, only the count does.
/// Buckets are not synchronised on their own, the owning counter's lock guards them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Inclusive start of the interval
    window_start: u64,

    /// Exclusive end of the interval, always greater than `window_start`
    window_end: u64,

    /// Events recorded while this bucket was current
    count: u64,
}

impl Bucket {
    /// Create an empty bucket starting at `window_start` and lasting `duration_nanos`
    pub(crate) fn new(window_start: u64, duration_nanos: u64) -> Self {
        debug_assert!(duration_nanos > 0, "bucket duration must be non-zero");
        Self { window_start, window_end: window_start.saturating_add(duration_nanos.max(1)), count: 0 }
    }

    #[inline]
    pub(crate) fn incr(&mut self) {
        self.add(1);
    }

    #[inline]
    pub(crate) fn add(&mut self, n: u64) {
        self.count = self.count.saturating_add(n);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn window_start(&self) -> u64 {
        self.window_start
    }

    #[inline]
    pub fn window_end(&self) -> u64 {
        self.window_end
    }

    /// Whether `now` falls inside `[window_start, window_end)`
    #[inline]
    pub fn contains(&self, now: u64) -> bool {
        self.window_start <= now && now < self.window_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bucket_is_empty() {
        let bucket = Bucket::new(1_000, 100);
        assert_eq!(bucket.count(), 0);
        assert_eq!(bucket.window_start(), 1_000);
        assert_eq!(bucket.window_end(), 1_100);
    }

    #[test]
    fn test_incr_and_add() {
        let mut bucket = Bucket::new(0, 10);
        bucket.incr();
        bucket.incr();
        bucket.add(5);
        assert_eq!(bucket.count(), 7);
    }

    #[test]
    fn test_half_open_interval() {
        let bucket = Bucket::new(100, 50);
        assert!(!bucket.contains(99));
        assert!(bucket.contains(100));
        assert!(bucket.contains(149));
        assert!(!bucket.contains(150));
    }
}
