use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crossbeam_channel::RecvTimeoutError;
use crossbeam_channel::bounded;
use rc_counter::Clock;
use rc_counter::CounterError;
use rc_counter::RateLimiter;
use rc_counter::RollingCounterConfig;
use rc_counter::RollingLimiter;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Outcomes buffered per worker before workers block on the reporter
const OUTCOME_CHANNEL_DEPTH: usize = 64;

/// Settings for one load-driver run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Window and bucket layout of the shared counter
    pub counter: RollingCounterConfig,

    /// Requests admitted per trailing window
    pub limit: u64,

    /// Number of worker threads, fixed for the whole run
    pub workers: usize,

    /// Requests each worker issues before exiting
    pub requests_per_worker: u64,

    /// Pause between two requests of the same worker
    pub request_interval_ms: u64,

    /// How often the reporter logs progress
    pub report_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            counter: RollingCounterConfig::default(),
            limit: 5,
            workers: num_cpus::get(),
            requests_per_worker: 100,
            request_interval_ms: 10,
            report_interval_ms: 500,
        }
    }
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Rolling counter error: {0}")]
    Counter(#[from] CounterError),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Worker thread {0} panicked")]
    WorkerPanicked(usize),

    #[error("Invalid driver configuration: {0}")]
    InvalidConfig(&'static str),
}

/// What happened to a single simulated request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Admitted,
    Rejected,
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverReport {
    pub admitted: u64,
    pub rejected: u64,
    /// Rolling sum read after every worker has exited
    pub final_sum: u64,
}

impl DriverReport {
    pub fn total(&self) -> u64 {
        self.admitted + self.rejected
    }
}

/// Run the driver against a fresh limiter built from `config`
pub fn run(config: &DriverConfig, running: Arc<AtomicBool>) -> Result<DriverReport, DriverError> {
    let limiter = Arc::new(RollingLimiter::from_config(config.limit, &config.counter)?);
    run_with_limiter(config, limiter, running)
}

/// Run the driver against an existing limiter
///
/// Spawns `config.workers` threads, each doing check-then-record through the
/// limiter, and tallies their outcomes on the calling thread until every worker
/// has finished or `running` is cleared.
pub fn run_with_limiter<C: Clock + 'static>(
    config: &DriverConfig,
    limiter: Arc<RollingLimiter<C>>,
    running: Arc<AtomicBool>,
) -> Result<DriverReport, DriverError> {
    if config.workers == 0 {
        return Err(DriverError::InvalidConfig("workers must be greater than 0"));
    }

    let (tx, rx) = bounded::<Outcome>(config.workers * OUTCOME_CHANNEL_DEPTH);
    let interval = Duration::from_millis(config.request_interval_ms);

    let mut handles = Vec::with_capacity(config.workers);
    for worker_id in 0..config.workers {
        let limiter = Arc::clone(&limiter);
        let running = Arc::clone(&running);
        let tx = tx.clone();
        let requests = config.requests_per_worker;

        let handle = thread::Builder::new().name(format!("rc-worker-{worker_id}")).spawn(move || {
            for _ in 0..requests {
                if !running.load(Ordering::Relaxed) {
                    break;
                }

                let outcome = match limiter.try_acquire_one() {
                    Ok(()) => Outcome::Admitted,
                    Err(_) => Outcome::Rejected,
                };

                // Reporter gone, nobody left to count for
                if tx.send(outcome).is_err() {
                    break;
                }

                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
            debug!("Worker {worker_id} exiting");
        })?;

        handles.push(handle);
    }

    // Only worker clones remain, so the channel disconnects once they all exit
    drop(tx);

    let report_interval = Duration::from_millis(config.report_interval_ms.max(1));
    let mut report = DriverReport::default();
    let mut last_report = Instant::now();

    loop {
        match rx.recv_timeout(report_interval) {
            Ok(Outcome::Admitted) => report.admitted += 1,
            Ok(Outcome::Rejected) => report.rejected += 1,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if last_report.elapsed() >= report_interval {
            info!(
                "Progress: admitted={}, rejected={}, rolling_sum={}/{}",
                report.admitted,
                report.rejected,
                limiter.counter().sum(),
                limiter.capacity()
            );
            last_report = Instant::now();
        }
    }

    for (worker_id, handle) in handles.into_iter().enumerate() {
        handle.join().map_err(|_| DriverError::WorkerPanicked(worker_id))?;
    }

    report.final_sum = limiter.counter().sum();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use rc_counter::ManualClock;
    use rc_counter::RollingCounter;

    use super::*;

    fn test_config(limit: u64, workers: usize, requests_per_worker: u64) -> DriverConfig {
        DriverConfig {
            counter: RollingCounterConfig { window_ms: 60_000, num_buckets: 10 },
            limit,
            workers,
            requests_per_worker,
            request_interval_ms: 0,
            report_interval_ms: 50,
        }
    }

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.limit, 5);
        assert!(config.workers >= 1);
        assert_eq!(config.counter, RollingCounterConfig::default());
    }

    #[test]
    fn test_every_request_is_accounted_for() {
        let config = test_config(5, 4, 10);
        let report = run(&config, Arc::new(AtomicBool::new(true))).unwrap();

        assert_eq!(report.total(), 40);
        assert!(report.admitted >= 5);
        assert!(report.admitted <= 5 + 4 - 1);
        assert_eq!(report.final_sum, report.admitted);
    }

    #[test]
    fn test_generous_limit_admits_everything() {
        let config = test_config(1_000, 4, 25);
        let report = run(&config, Arc::new(AtomicBool::new(true))).unwrap();

        assert_eq!(report.admitted, 100);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.final_sum, 100);
    }

    #[test]
    fn test_stopped_driver_issues_no_requests() {
        let config = test_config(5, 4, 10);
        let report = run(&config, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(report, DriverReport::default());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = test_config(5, 0, 10);
        let result = run(&config, Arc::new(AtomicBool::new(true)));
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_counter_config_rejected() {
        let mut config = test_config(5, 2, 10);
        config.counter.num_buckets = 0;
        let result = run(&config, Arc::new(AtomicBool::new(true)));
        assert!(matches!(result, Err(DriverError::Counter(CounterError::InvalidConfig(_)))));
    }

    #[test]
    fn test_runs_against_injected_limiter() {
        let clock = ManualClock::new();
        let counter = RollingCounter::with_clock(1000, 10, clock).unwrap();
        let limiter = Arc::new(RollingLimiter::with_counter(counter, 3).unwrap());

        let config = test_config(3, 1, 10);
        let report = run_with_limiter(&config, Arc::clone(&limiter), Arc::new(AtomicBool::new(true))).unwrap();

        // A single worker never races itself, so the limit is exact
        assert_eq!(report.admitted, 3);
        assert_eq!(report.rejected, 7);
        assert_eq!(limiter.available(), 0);
    }
}
