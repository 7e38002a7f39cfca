use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Minimum response time recorded for a processor whose health endpoint
/// could not be reached.
pub const UNREACHABLE_MIN_RESPONSE_TIME_MS: u64 = 1000;

/// The two downstream payment processors. `Default` is the primary (cheaper)
/// processor, `Fallback` the secondary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorName {
    Default,
    Fallback,
}

impl ProcessorName {
    pub const ALL: [ProcessorName; 2] = [ProcessorName::Default, ProcessorName::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorName::Default => "default",
            ProcessorName::Fallback => "fallback",
        }
    }

    /// Where a failed delivery is retried next, if anywhere.
    pub fn failover_target(&self) -> Option<ProcessorName> {
        match self {
            ProcessorName::Default => Some(ProcessorName::Fallback),
            ProcessorName::Fallback => None,
        }
    }
}

impl std::fmt::Display for ProcessorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Last known operational status of one processor.
///
/// Snapshots are replaced wholesale on every refresh; `last_checked_at` is
/// `None` until the first probe.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorHealth {
    pub failing: bool,
    pub min_response_time: u64,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl ProcessorHealth {
    /// Optimistic snapshot used before the first probe.
    pub fn unchecked(min_response_time: u64) -> Self {
        Self {
            failing: false,
            min_response_time,
            last_checked_at: None,
        }
    }

    pub fn checked(failing: bool, min_response_time: u64, at: DateTime<Utc>) -> Self {
        Self {
            failing,
            min_response_time,
            last_checked_at: Some(at),
        }
    }

    /// Pessimistic snapshot for a processor whose health endpoint is unreachable.
    pub fn unreachable(at: DateTime<Utc>) -> Self {
        Self::checked(true, UNREACHABLE_MIN_RESPONSE_TIME_MS, at)
    }

    /// A never-checked snapshot is always stale. An entry exactly `ttl` old is
    /// still fresh.
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match self.last_checked_at {
            None => true,
            // Negative ages (clock stepped back) count as fresh.
            Some(checked_at) => match (now - checked_at).to_std() {
                Ok(age) => age > ttl,
                Err(_) => false,
            },
        }
    }
}

/// Body of `GET <base>/payments/service-health`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HealthCheckResponse {
    pub failing: bool,
    #[serde(rename = "minResponseTime")]
    pub min_response_time: u64,
}

/// A validated client payment intent handed to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub correlation_id: Uuid,
    pub amount: f64,
}

/// Body of `POST <base>/payments`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorPaymentRequest {
    pub correlation_id: Uuid,
    pub amount: f64,
    pub requested_at: String,
}

impl ProcessorPaymentRequest {
    pub fn new(payment: &Payment, requested_at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: payment.correlation_id,
            amount: payment.amount,
            requested_at: requested_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Aggregate counters for one processor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorSummary {
    pub total_requests: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentsSummary {
    pub default: ProcessorSummary,
    pub fallback: ProcessorSummary,
}
