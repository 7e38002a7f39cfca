//! Counter store for payment summaries
//!
//! This module provides the store behind the `/payments-summary` totals:
//! - Redis hashes updated with atomic pipelined increments
//! - Graceful degradation to a process-local or no-op store when Redis is
//!   unavailable, decided once at startup

pub mod error;
pub mod keys;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use store::{InMemorySummaryStore, NoopSummaryStore, StoreFallback, SummaryStore};

#[cfg(feature = "cache")]
pub use store::RedisSummaryStore;

#[cfg(feature = "cache")]
use bb8::Pool;
#[cfg(feature = "cache")]
use bb8_redis::{redis, RedisConnectionManager};
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "cache")]
use tracing::error;
use tracing::{info, warn};

/// Redis connection pool type alias
#[cfg(feature = "cache")]
pub type RedisPool = Pool<RedisConnectionManager>;

/// Counter-store configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum idle connections
    pub min_idle: u32,
    /// Connection timeout
    pub connection_timeout: Duration,
    /// Store used when Redis cannot be reached
    pub fallback: StoreFallback,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            max_connections: 32,
            min_idle: 4,
            connection_timeout: Duration::from_secs(2),
            fallback: StoreFallback::Noop,
        }
    }
}

/// Initialize the Redis connection pool and verify it answers PING.
#[cfg(feature = "cache")]
pub async fn init_cache_pool(config: &CacheConfig) -> Result<RedisPool, CacheError> {
    info!(
        max_connections = config.max_connections,
        redis_url = %config.redis_url,
        "Initializing Redis counter store pool"
    );

    let manager = RedisConnectionManager::new(config.redis_url.as_str()).map_err(|e| {
        error!("Failed to create Redis connection manager: {}", e);
        CacheError::ConnectionError(e.to_string())
    })?;

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(config.min_idle)
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .await
        .map_err(|e| {
            error!("Failed to build Redis connection pool: {}", e);
            CacheError::ConnectionError(e.to_string())
        })?;

    health_check(&pool).await?;

    info!("Redis counter store pool initialized successfully");
    Ok(pool)
}

/// PING through the pool.
#[cfg(feature = "cache")]
pub async fn health_check(pool: &RedisPool) -> Result<(), CacheError> {
    let mut conn = pool.get().await?;
    let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
    Ok(())
}

/// Pick the summary store for this process. Never fails: when Redis is not
/// reachable the configured fallback is used and the degradation is logged
/// once here.
pub async fn connect_summary_store(config: &CacheConfig) -> Arc<dyn SummaryStore> {
    #[cfg(feature = "cache")]
    {
        match init_cache_pool(config).await {
            Ok(pool) => return Arc::new(RedisSummaryStore::new(pool)),
            Err(e) => {
                warn!(
                    error = %e,
                    fallback = ?config.fallback,
                    "Redis counter store unavailable, summaries will not be persisted"
                );
            }
        }
    }

    #[cfg(not(feature = "cache"))]
    warn!(
        fallback = ?config.fallback,
        "Built without Redis support, summaries will not be persisted"
    );

    fallback_store(config.fallback)
}

pub fn fallback_store(fallback: StoreFallback) -> Arc<dyn SummaryStore> {
    match fallback {
        StoreFallback::Noop => Arc::new(NoopSummaryStore),
        StoreFallback::Memory => {
            info!("Using in-process summary counters");
            Arc::new(InMemorySummaryStore::new())
        }
    }
}
