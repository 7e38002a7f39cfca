//! Processor selection policy

use crate::processors::{ProcessorHealth, ProcessorName};
use crate::services::health_cache::HealthCache;
use std::sync::Arc;

/// Primary unless its snapshot says it is failing. Latency is not an input.
pub fn choose(primary: &ProcessorHealth) -> ProcessorName {
    if primary.failing {
        ProcessorName::Fallback
    } else {
        ProcessorName::Default
    }
}

#[derive(Clone)]
pub struct ProcessorSelector {
    health: Arc<HealthCache>,
}

impl ProcessorSelector {
    pub fn new(health: Arc<HealthCache>) -> Self {
        Self { health }
    }

    /// Only the primary's health is read; the secondary is used as-is and
    /// delivery-level failure handles the case where it is down too.
    pub async fn select(&self) -> ProcessorName {
        let primary = self.health.get(ProcessorName::Default).await;
        choose(&primary)
    }
}
