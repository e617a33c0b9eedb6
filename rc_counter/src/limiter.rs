use std::future::Future;
use std::pin::Pin;

use crate::config::RollingCounterConfig;
use crate::error::CounterError;
use crate::error::Result;
use crate::rolling_counter::RollingCounter;
use crate::time::Clock;
use crate::time::TimeSource;

/// Admission control over some notion of recent load
pub trait RateLimiter: Send + Sync {
    /// Try to admit a request of the given weight without blocking
    fn try_acquire(&self, weight: u64) -> Result<()>;

    /// Try to admit a single request without blocking
    fn try_acquire_one(&self) -> Result<()> {
        self.try_acquire(1)
    }

    /// Asynchronously wait until the request fits, then admit it
    fn acquire(&self, weight: u64) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Asynchronously admit a single request
    fn acquire_one(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.acquire(1)
    }

    /// Remaining headroom before requests are rejected
    fn available(&self) -> u64;

    /// Maximum load admitted within the window
    fn capacity(&self) -> u64;

    /// Forget all recorded load
    fn reset(&self);
}

/// Threshold limiter over a [`RollingCounter`]
///
/// A request is admitted when the rolling sum plus its weight stays within
/// `limit`, and is then recorded in the counter. The check and the record are
/// separate lock acquisitions, so concurrent callers can overshoot the limit
/// by up to one request each. That makes this approximate admission control,
/// good for shedding load, not for enforcing a hard quota.
pub struct RollingLimiter<C: Clock = TimeSource> {
    counter: RollingCounter<C>,
    limit: u64,
}

impl RollingLimiter {
    /// Create a limiter admitting `limit` events per `window_ms`, tracked in `num_buckets` buckets
    pub fn new(limit: u64, window_ms: u64, num_buckets: usize) -> Result<Self> {
        Self::with_counter(RollingCounter::new(window_ms, num_buckets)?, limit)
    }

    /// Create a limiter from a counter configuration
    pub fn from_config(limit: u64, config: &RollingCounterConfig) -> Result<Self> {
        Self::with_counter(config.build()?, limit)
    }
}

impl<C: Clock> RollingLimiter<C> {
    /// Wrap an existing counter
    pub fn with_counter(counter: RollingCounter<C>, limit: u64) -> Result<Self> {
        if limit == 0 {
            return Err(CounterError::InvalidConfig("limit must be greater than 0"));
        }

        Ok(Self { counter, limit })
    }

    /// The underlying counter
    pub fn counter(&self) -> &RollingCounter<C> {
        &self.counter
    }
}

impl<C: Clock> RateLimiter for RollingLimiter<C> {
    #[inline]
    fn try_acquire(&self, weight: u64) -> Result<()> {
        if weight == 0 {
            return Ok(());
        }

        let current = self.counter.sum();
        if current.saturating_add(weight) > self.limit {
            return Err(CounterError::Exceeded);
        }

        self.counter.increment_by(weight);
        Ok(())
    }

    fn acquire(&self, weight: u64) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            // Can never fit, waiting would spin forever
            if weight > self.limit {
                return Err(CounterError::Exceeded);
            }

            let retry_after = self.counter.bucket_duration();

            loop {
                match self.try_acquire(weight) {
                    Ok(()) => return Ok(()),
                    Err(CounterError::Exceeded) => tokio::time::sleep(retry_after).await,
                    Err(err) => return Err(err),
                }
            }
        })
    }

    fn available(&self) -> u64 {
        self.limit.saturating_sub(self.counter.sum())
    }

    fn capacity(&self) -> u64 {
        self.limit
    }

    fn reset(&self) {
        self.counter.reset();
    }
}
