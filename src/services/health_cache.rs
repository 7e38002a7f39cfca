//! Per-processor health snapshots with lazy, staleness-driven refresh.
//!
//! Concurrent readers that all find the same stale entry each trigger their
//! own probe; the duplicated work is bounded by the number of in-flight
//! payments during one refresh and is accepted instead of single-flighting.

use crate::processors::{HealthProbe, ProcessorHealth, ProcessorName};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Maximum age of a snapshot before it is refreshed.
pub const DEFAULT_HEALTH_TTL: Duration = Duration::from_secs(5);

const INITIAL_DEFAULT_MIN_RESPONSE_TIME_MS: u64 = 100;
const INITIAL_FALLBACK_MIN_RESPONSE_TIME_MS: u64 = 200;

pub struct HealthCache {
    entries: RwLock<HashMap<ProcessorName, ProcessorHealth>>,
    prober: Arc<dyn HealthProbe>,
    ttl: Duration,
}

impl HealthCache {
    /// Both processors start optimistic (not failing) and never checked.
    pub fn new(prober: Arc<dyn HealthProbe>, ttl: Duration) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            ProcessorName::Default,
            ProcessorHealth::unchecked(INITIAL_DEFAULT_MIN_RESPONSE_TIME_MS),
        );
        entries.insert(
            ProcessorName::Fallback,
            ProcessorHealth::unchecked(INITIAL_FALLBACK_MIN_RESPONSE_TIME_MS),
        );

        Self {
            entries: RwLock::new(entries),
            prober,
            ttl,
        }
    }

    /// Returns the processor's snapshot, probing first when the cached entry
    /// is missing or older than the TTL.
    ///
    /// If the probe is rate limited or malformed the previous entry is kept
    /// and returned as-is, even though it is stale.
    pub async fn get(&self, processor: ProcessorName) -> ProcessorHealth {
        if let Some(cached) = self.peek(processor).await {
            if !cached.is_stale(self.ttl, Utc::now()) {
                return cached;
            }
        }

        self.refresh(processor).await;

        self.peek(processor)
            .await
            .unwrap_or_else(|| ProcessorHealth::unchecked(0))
    }

    /// Cached snapshot without triggering a probe.
    pub async fn peek(&self, processor: ProcessorName) -> Option<ProcessorHealth> {
        self.entries.read().await.get(&processor).copied()
    }

    /// Replaces the processor's snapshot wholesale.
    pub async fn set(&self, processor: ProcessorName, health: ProcessorHealth) {
        self.entries.write().await.insert(processor, health);
    }

    /// Copy of every cached snapshot, for reporting.
    pub async fn snapshot(&self) -> HashMap<ProcessorName, ProcessorHealth> {
        self.entries.read().await.clone()
    }

    async fn refresh(&self, processor: ProcessorName) {
        // The lock is not held while probing.
        match self.prober.probe(processor).await.into_snapshot() {
            Some(health) => {
                debug!(
                    processor = %processor,
                    failing = health.failing,
                    min_response_time = health.min_response_time,
                    "Health cache updated"
                );
                self.set(processor, health).await;
            }
            None => {
                debug!(processor = %processor, "Health probe left cache unchanged");
            }
        }
    }
}
