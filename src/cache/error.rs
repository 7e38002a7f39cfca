//! Counter-store error types

use std::fmt;

/// Counter-store operation errors
#[derive(Debug)]
pub enum CacheError {
    /// Connection-related errors (Redis unavailable, pool exhausted, network issues)
    ConnectionError(String),
    /// Command-specific errors
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::ConnectionError(msg) => write!(f, "Counter store connection error: {}", msg),
            CacheError::OperationError(msg) => write!(f, "Counter store operation error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

#[cfg(feature = "cache")]
impl From<bb8_redis::redis::RedisError> for CacheError {
    fn from(err: bb8_redis::redis::RedisError) -> Self {
        CacheError::OperationError(err.to_string())
    }
}

#[cfg(feature = "cache")]
impl From<bb8::RunError<bb8_redis::redis::RedisError>> for CacheError {
    fn from(err: bb8::RunError<bb8_redis::redis::RedisError>) -> Self {
        CacheError::ConnectionError(format!("Pool error: {}", err))
    }
}

/// Result type alias for counter-store operations
pub type CacheResult<T> = Result<T, CacheError>;
