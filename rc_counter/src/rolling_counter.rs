use std::fmt;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;

use crate::bucket::Bucket;
use crate::config::RollingCounterBuilder;
use crate::config::RollingCounterConfig;
use crate::error::Result;
use crate::ring::BucketRing;
use crate::time::Clock;
use crate::time::TimeSource;
use crate::time::millis_to_nanos;

/// Event counter over a trailing time window
///
/// The window is split into `num_buckets` buckets of `window / num_buckets`
/// each, held in a fixed ring. Buckets are created lazily: the first event
/// opens a bucket at "now", and later calls append contiguous buckets until
/// one covers the current instant, evicting the oldest as the ring fills. If a
/// whole window passes with no calls at all, the ring is wiped and restarted
/// from a single fresh bucket instead.
///
/// All mutation happens under one write lock. Reads take the shared lock and
/// only escalate to the write lock when stale buckets have to be rotated out.
///
/// `sum()` followed by `increment()` is not atomic: concurrent callers doing
/// check-then-act may overshoot a threshold by up to `callers - 1`.
pub struct RollingCounter<C: Clock = TimeSource> {
    /// Configured window in milliseconds
    window_ms: u64,

    /// Span covered by a full ring, `num_buckets * bucket_nanos`
    span_nanos: u64,

    /// Number of buckets the window is split into
    num_buckets: usize,

    /// Duration of a single bucket in nanoseconds
    bucket_nanos: u64,

    ring: RwLock<BucketRing>,

    clock: C,
}

impl RollingCounter {
    /// Create a counter over `window_ms` milliseconds split into `num_buckets` buckets
    ///
    /// Fails if either value is zero, or if `window_ms / num_buckets` truncates to zero.
    pub fn new(window_ms: u64, num_buckets: usize) -> Result<Self> {
        Self::with_clock(window_ms, num_buckets, TimeSource::new())
    }

    /// Create a counter from a deserialised configuration
    pub fn from_config(config: &RollingCounterConfig) -> Result<Self> {
        config.build()
    }

    /// Create a builder for configuring a rolling counter
    pub fn builder() -> RollingCounterBuilder {
        RollingCounterBuilder::new()
    }
}

impl<C: Clock> RollingCounter<C> {
    /// Create a counter reading time from `clock`
    pub fn with_clock(window_ms: u64, num_buckets: usize, clock: C) -> Result<Self> {
        let bucket_ms = RollingCounterConfig { window_ms, num_buckets }.validate()?;
        let bucket_nanos = millis_to_nanos(bucket_ms);

        Ok(Self {
            window_ms,
            span_nanos: bucket_nanos.saturating_mul(num_buckets as u64),
            num_buckets,
            bucket_nanos,
            ring: RwLock::new(BucketRing::new(num_buckets)),
            clock,
        })
    }

    /// Record one event in the current bucket
    pub fn increment(&self) {
        let now = self.clock.now_nanos();
        let mut ring = self.ring.write();

        if let Some(bucket) = self.current_bucket(&mut ring, now) {
            bucket.incr();
        }
    }

    /// Record `n` events in the current bucket
    pub fn increment_by(&self, n: u64) {
        let now = self.clock.now_nanos();
        let mut ring = self.ring.write();

        if let Some(bucket) = self.current_bucket(&mut ring, now) {
            bucket.add(n);
        }
    }

    /// Total events across every live bucket
    ///
    /// Stale buckets are rotated out first, so a read after a long idle gap
    /// reports an empty window rather than old counts.
    pub fn sum(&self) -> u64 {
        let now = self.clock.now_nanos();

        {
            let ring = self.ring.read();
            match ring.peek_last() {
                None => return 0,
                Some(last) if now < last.window_end() => return ring.sum(),
                Some(_) => {}
            }
        }

        let mut ring = self.ring.write();
        self.roll(&mut ring, now);
        ring.sum()
    }

    /// Copies of the live buckets, oldest first, after rotating out stale ones
    pub fn snapshot(&self) -> Vec<Bucket> {
        let now = self.clock.now_nanos();
        let mut ring = self.ring.write();

        if !ring.is_empty() {
            self.roll(&mut ring, now);
        }

        ring.iter().copied().collect()
    }

    /// Number of buckets currently held, without rotating
    pub fn len(&self) -> usize {
        self.ring.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.read().is_empty()
    }

    /// Drop all recorded history
    pub fn reset(&self) {
        self.ring.write().reset();
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn bucket_duration(&self) -> Duration {
        Duration::from_nanos(self.bucket_nanos)
    }

    pub fn num_buckets(&self) -> usize {
        self.num_buckets
    }

    /// Resolve the bucket covering `now`, creating or rotating buckets as needed
    #[inline]
    fn current_bucket<'a>(&self, ring: &'a mut BucketRing, now: u64) -> Option<&'a mut Bucket> {
        self.roll(ring, now);
        ring.peek_last_mut()
    }

    /// Make the newest bucket in `ring` the one covering `now`
    ///
    /// Gaps shorter than a full window are filled bucket by bucket so the
    /// boundaries stay contiguous; anything longer wipes the ring.
    fn roll(&self, ring: &mut BucketRing, now: u64) {
        match ring.peek_last().copied() {
            Some(last) if now < last.window_end() => return,
            Some(_) => {}
            None => {
                ring.add_last(Bucket::new(now, self.bucket_nanos));
                return;
            }
        }

        for _ in 0..self.num_buckets {
            let Some(last) = ring.peek_last().copied() else {
                break;
            };

            if now < last.window_end() {
                return;
            }

            if now >= last.window_end().saturating_add(self.span_nanos) {
                debug!("Rolling window idle for {}ns, dropping {} buckets", now - last.window_end(), ring.len());
                ring.reset();
                ring.add_last(Bucket::new(now, self.bucket_nanos));
                return;
            }

            if let Some(evicted) = ring.add_last(Bucket::new(last.window_end(), self.bucket_nanos)) {
                trace!("Evicted bucket starting at {} with count {}", evicted.window_start(), evicted.count());
            }
        }
    }
}

impl<C: Clock> fmt::Debug for RollingCounter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buckets = self.ring.read().iter().map(|b| (b.window_start(), b.count())).collect::<Vec<_>>();

        f.debug_struct("RollingCounter")
            .field("window_ms", &self.window_ms)
            .field("num_buckets", &self.num_buckets)
            .field("bucket_nanos", &self.bucket_nanos)
            .field("buckets", &buckets)
            .finish()
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;
    use crate::time::ManualClock;

    proptest! {
        #[test]
        fn prop_buckets_contiguous_bounded_and_summed(
            num_buckets in 1usize..12,
            bucket_ms in 1u64..50,
            steps in prop::collection::vec((0u64..400, 0u64..4), 1..60),
        ) {
            let window_ms = bucket_ms * num_buckets as u64;
            let window_nanos = millis_to_nanos(window_ms);
            let clock = ManualClock::new();
            let counter = RollingCounter::with_clock(window_ms, num_buckets, clock.clone()).unwrap();

            for (advance_ms, hits) in steps {
                clock.advance_millis(advance_ms);
                for _ in 0..hits {
                    counter.increment();
                }

                let now = clock.now_nanos();
                let snapshot = counter.snapshot();

                prop_assert!(snapshot.len() <= num_buckets);
                for pair in snapshot.windows(2) {
                    prop_assert!(pair[0].window_start() < pair[1].window_start());
                    prop_assert_eq!(pair[1].window_start(), pair[0].window_end());
                }
                for bucket in &snapshot {
                    prop_assert!(bucket.window_end() > now.saturating_sub(window_nanos));
                }
                if let Some(last) = snapshot.last() {
                    prop_assert!(last.contains(now));
                }

                let expected = snapshot.iter().map(Bucket::count).sum::<u64>();
                prop_assert_eq!(counter.sum(), expected);
                prop_assert_eq!(counter.sum(), expected);
            }
        }

        #[test]
        fn prop_events_within_one_bucket_are_never_lost(
            hits in prop::collection::vec(1u64..20, 1..30),
        ) {
            let clock = ManualClock::new();
            let counter = RollingCounter::with_clock(10_000, 10, clock.clone()).unwrap();
            let mut total = 0;

            for n in hits {
                counter.increment_by(n);
                total += n;
                clock.advance_millis(10);
            }

            prop_assert_eq!(counter.sum(), total);
        }
    }
}
