pub mod bucket;
pub mod config;
pub mod error;
pub mod limiter;
pub mod ring;
pub mod rolling_counter;
pub mod time;

pub use bucket::Bucket;
pub use config::RollingCounterBuilder;
pub use config::RollingCounterConfig;
pub use error::CounterError;
pub use error::Result;
pub use limiter::RateLimiter;
pub use limiter::RollingLimiter;
pub use rolling_counter::RollingCounter;
pub use time::Clock;
pub use time::ManualClock;
pub use time::TimeSource;
