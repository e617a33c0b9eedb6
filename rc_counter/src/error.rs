use thiserror::Error;

/// Errors produced by the rolling counter and the limiters built on it
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterError {
    /// Rejected at construction time, the counter is never built
    #[error("Invalid rolling counter configuration: {0}")]
    InvalidConfig(&'static str),

    /// Admitting the request would push the rolling sum past the limit
    #[error("Rate limit exceeded")]
    Exceeded,
}

/// Result type for rolling counter operations
pub type Result<T> = std::result::Result<T, CounterError>;
