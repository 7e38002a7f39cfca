//! Health check module
//! Reports gateway liveness, the cached processor snapshots and the counter store

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cache::SummaryStore;
use crate::processors::{ProcessorHealth, ProcessorName};
use crate::services::HealthCache;

const STORE_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub checks: HashMap<String, ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    /// Payments are still accepted but something is failing or unpersisted.
    Degraded,
    /// Both processors report failing.
    Unhealthy,
}

/// Individual component health status
#[derive(Debug, Serialize, Clone)]
pub struct ComponentHealth {
    pub status: ComponentState,
    pub response_time_ms: Option<u128>,
    pub details: Option<String>,
}

/// Component state
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Up,
    Down,
    Warning,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            status: HealthState::Healthy,
            checks: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthState::Healthy)
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentHealth {
    pub fn up(response_time_ms: Option<u128>) -> Self {
        Self {
            status: ComponentState::Up,
            response_time_ms,
            details: None,
        }
    }

    pub fn down(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Down,
            response_time_ms: None,
            details,
        }
    }

    pub fn warning(response_time_ms: Option<u128>, details: Option<String>) -> Self {
        Self {
            status: ComponentState::Warning,
            response_time_ms,
            details,
        }
    }

    /// Reads a cached snapshot; `minResponseTime` is reported as the
    /// response time.
    pub fn from_processor(health: &ProcessorHealth) -> Self {
        let reported = Some(u128::from(health.min_response_time));
        match health.last_checked_at {
            None => Self::warning(reported, Some("never checked".to_string())),
            Some(_) if health.failing => Self {
                status: ComponentState::Down,
                response_time_ms: reported,
                details: Some("processor reports failing".to_string()),
            },
            Some(at) => Self {
                status: ComponentState::Up,
                response_time_ms: reported,
                details: Some(format!("last checked at {}", at.to_rfc3339())),
            },
        }
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    health_cache: Arc<HealthCache>,
    store: Arc<dyn SummaryStore>,
}

impl HealthChecker {
    pub fn new(health_cache: Arc<HealthCache>, store: Arc<dyn SummaryStore>) -> Self {
        Self {
            health_cache,
            store,
        }
    }

    /// Never probes a processor; only the counter store is contacted.
    pub async fn check_health(&self) -> HealthStatus {
        let mut health_status = HealthStatus::new();
        let snapshots = self.health_cache.snapshot().await;

        let mut failing = 0;
        for processor in ProcessorName::ALL {
            let component = snapshots
                .get(&processor)
                .map(ComponentHealth::from_processor)
                .unwrap_or_else(|| ComponentHealth::warning(None, Some("no snapshot".to_string())));
            if component.status == ComponentState::Down {
                failing += 1;
            }
            health_status
                .checks
                .insert(format!("processor_{}", processor), component);
        }

        let store = check_store_health(self.store.as_ref()).await;
        health_status.checks.insert("summary_store".to_string(), store);

        let all_up = health_status
            .checks
            .values()
            .all(|c| c.status == ComponentState::Up);

        health_status.status = if failing == ProcessorName::ALL.len() {
            HealthState::Unhealthy
        } else if all_up {
            HealthState::Healthy
        } else {
            HealthState::Degraded
        };

        health_status
    }
}

/// PING the counter store with a timeout; a non-persistent store is a warning.
pub async fn check_store_health(store: &dyn SummaryStore) -> ComponentHealth {
    let start = Instant::now();

    match timeout(STORE_CHECK_TIMEOUT, store.ping()).await {
        Ok(Ok(())) => {
            let elapsed = start.elapsed().as_millis();
            debug!(store = store.name(), "Summary store health check: OK ({}ms)", elapsed);
            if store.name() == "redis" {
                ComponentHealth::up(Some(elapsed))
            } else {
                ComponentHealth::warning(
                    Some(elapsed),
                    Some(format!("{} store, summaries are not persisted", store.name())),
                )
            }
        }
        Ok(Err(e)) => {
            warn!(store = store.name(), error = %e, "Summary store health check failed");
            ComponentHealth::down(Some(e.to_string()))
        }
        Err(_) => {
            warn!(store = store.name(), "Summary store health check timed out");
            ComponentHealth::down(Some("Timeout".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemorySummaryStore, NoopSummaryStore};
    use crate::processors::{HealthProbe, ProbeOutcome};
    use async_trait::async_trait;
    use chrono::Utc;

    struct PanicProbe;

    #[async_trait]
    impl HealthProbe for PanicProbe {
        async fn probe(&self, _processor: ProcessorName) -> ProbeOutcome {
            panic!("health endpoint must not probe processors");
        }
    }

    fn cache() -> Arc<HealthCache> {
        Arc::new(HealthCache::new(Arc::new(PanicProbe), Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn test_health_status_creation() {
        let health_status = HealthStatus::new();
        assert!(matches!(health_status.status, HealthState::Healthy));
        assert!(health_status.checks.is_empty());
        assert!(health_status.timestamp <= chrono::Utc::now());
    }

    #[test]
    fn test_component_health_states() {
        let up_health = ComponentHealth::up(Some(100));
        assert!(matches!(up_health.status, ComponentState::Up));
        assert_eq!(up_health.response_time_ms, Some(100));

        let down_health = ComponentHealth::down(Some("Test error".to_string()));
        assert!(matches!(down_health.status, ComponentState::Down));
        assert_eq!(down_health.details, Some("Test error".to_string()));
    }

    #[test]
    fn test_processor_snapshot_mapping() {
        let never = ComponentHealth::from_processor(&ProcessorHealth::unchecked(100));
        assert_eq!(never.status, ComponentState::Warning);

        let failing =
            ComponentHealth::from_processor(&ProcessorHealth::unreachable(Utc::now()));
        assert_eq!(failing.status, ComponentState::Down);
        assert_eq!(failing.response_time_ms, Some(1000));

        let ok = ComponentHealth::from_processor(&ProcessorHealth::checked(false, 12, Utc::now()));
        assert_eq!(ok.status, ComponentState::Up);
    }

    #[tokio::test]
    async fn test_fresh_start_is_degraded_without_probing() {
        let checker = HealthChecker::new(cache(), Arc::new(NoopSummaryStore));

        let status = checker.check_health().await;

        assert_eq!(status.status, HealthState::Degraded);
        assert_eq!(status.checks.len(), 3);
        assert_eq!(status.checks["summary_store"].status, ComponentState::Warning);
    }

    #[tokio::test]
    async fn test_both_processors_failing_is_unhealthy() {
        let cache = cache();
        for processor in ProcessorName::ALL {
            cache
                .set(processor, ProcessorHealth::unreachable(Utc::now()))
                .await;
        }
        let checker = HealthChecker::new(cache, Arc::new(InMemorySummaryStore::new()));

        let status = checker.check_health().await;

        assert_eq!(status.status, HealthState::Unhealthy);
        assert!(!status.is_healthy());
    }
}
