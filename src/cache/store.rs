//! Summary counter stores
//!
//! `SummaryStore` is the narrow contract the aggregator consumes: increment
//! both counters of one processor, read them back, ping. Atomicity across
//! concurrent callers is the store's job.

use crate::cache::error::CacheResult;
use crate::processors::{ProcessorName, ProcessorSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;

#[cfg(feature = "cache")]
use crate::cache::keys::{SummaryKey, TOTAL_AMOUNT_FIELD, TOTAL_REQUESTS_FIELD};
#[cfg(feature = "cache")]
use crate::cache::RedisPool;
#[cfg(feature = "cache")]
use bb8_redis::redis;
#[cfg(feature = "cache")]
use tracing::warn;

#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Adds one request and `amount` to the processor's totals.
    async fn increment(&self, processor: ProcessorName, amount: f64) -> CacheResult<()>;

    /// Reads both totals; an absent entry reads as zero.
    async fn read(&self, processor: ProcessorName) -> CacheResult<ProcessorSummary>;

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}

/// Store used when no counter store is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFallback {
    /// Increments are dropped and reads return zero.
    Noop,
    /// Counters live in process memory and vanish on restart.
    Memory,
}

impl FromStr for StoreFallback {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "noop" | "none" => Ok(StoreFallback::Noop),
            "memory" | "in-memory" => Ok(StoreFallback::Memory),
            other => Err(format!("unsupported summary store fallback: {}", other)),
        }
    }
}

/// Redis hashes keyed `summary:<processor>` with `totalRequests` and
/// `totalAmount` fields.
#[cfg(feature = "cache")]
#[derive(Clone)]
pub struct RedisSummaryStore {
    pool: RedisPool,
}

#[cfg(feature = "cache")]
impl RedisSummaryStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "cache")]
#[async_trait]
impl SummaryStore for RedisSummaryStore {
    async fn increment(&self, processor: ProcessorName, amount: f64) -> CacheResult<()> {
        let key = SummaryKey::new(processor).to_string();
        let mut conn = self.pool.get().await?;

        // HINCRBY for the integer count, HINCRBYFLOAT for the f64 amount,
        // applied in one MULTI/EXEC.
        let _: () = redis::pipe()
            .atomic()
            .hincr(&key, TOTAL_REQUESTS_FIELD, 1i64)
            .ignore()
            .hincr(&key, TOTAL_AMOUNT_FIELD, amount)
            .ignore()
            .query_async(&mut *conn)
            .await?;

        Ok(())
    }

    async fn read(&self, processor: ProcessorName) -> CacheResult<ProcessorSummary> {
        let key = SummaryKey::new(processor).to_string();
        let mut conn = self.pool.get().await?;

        let (requests, amount): (Option<String>, Option<String>) = redis::cmd("HMGET")
            .arg(&key)
            .arg(TOTAL_REQUESTS_FIELD)
            .arg(TOTAL_AMOUNT_FIELD)
            .query_async(&mut *conn)
            .await?;

        Ok(ProcessorSummary {
            total_requests: parse_counter(&key, TOTAL_REQUESTS_FIELD, requests),
            total_amount: parse_counter(&key, TOTAL_AMOUNT_FIELD, amount),
        })
    }

    async fn ping(&self) -> CacheResult<()> {
        crate::cache::health_check(&self.pool).await
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// Missing or unparsable counters read as zero.
#[cfg(feature = "cache")]
fn parse_counter<T: FromStr + Default>(key: &str, field: &str, raw: Option<String>) -> T {
    match raw {
        None => T::default(),
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(key = %key, field = %field, value = %value, "Unparsable summary counter, reading as zero");
            T::default()
        }),
    }
}

/// Accepts every increment and forgets it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSummaryStore;

#[async_trait]
impl SummaryStore for NoopSummaryStore {
    async fn increment(&self, _processor: ProcessorName, _amount: f64) -> CacheResult<()> {
        Ok(())
    }

    async fn read(&self, _processor: ProcessorName) -> CacheResult<ProcessorSummary> {
        Ok(ProcessorSummary::default())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Process-local counters. Not persistent and not shared between instances.
#[derive(Debug, Default)]
pub struct InMemorySummaryStore {
    totals: RwLock<HashMap<ProcessorName, ProcessorSummary>>,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryStore for InMemorySummaryStore {
    async fn increment(&self, processor: ProcessorName, amount: f64) -> CacheResult<()> {
        let mut totals = self.totals.write().await;
        let entry = totals.entry(processor).or_default();
        entry.total_requests += 1;
        entry.total_amount += amount;
        Ok(())
    }

    async fn read(&self, processor: ProcessorName) -> CacheResult<ProcessorSummary> {
        let totals = self.totals.read().await;
        Ok(totals.get(&processor).copied().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
