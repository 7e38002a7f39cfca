//! HTTP client for the downstream payment processors.
//!
//! One `ProcessorClient` serves both processors; it implements the two seams
//! the services depend on: [`HealthProbe`] for the health endpoint and
//! [`PaymentTransport`] for single payment submissions. Retries live in the
//! delivery service, never here.

use crate::processors::error::{ProcessorError, ProcessorResult};
use crate::processors::types::{
    HealthCheckResponse, ProcessorHealth, ProcessorName, ProcessorPaymentRequest,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

pub const HEALTH_PATH: &str = "/payments/service-health";
pub const PAYMENTS_PATH: &str = "/payments";

/// Result of one health probe.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// Well-formed health report.
    Reported(ProcessorHealth),
    /// Health endpoint unreachable; carries the pessimistic snapshot.
    Unreachable(ProcessorHealth),
    /// HTTP 429 from the health endpoint.
    RateLimited,
    /// Response could not be decoded.
    Malformed(ProcessorError),
}

impl ProbeOutcome {
    /// The snapshot that should replace the cached one, if any. Rate-limited
    /// and malformed probes leave the cache untouched.
    pub fn into_snapshot(self) -> Option<ProcessorHealth> {
        match self {
            ProbeOutcome::Reported(health) | ProbeOutcome::Unreachable(health) => Some(health),
            ProbeOutcome::RateLimited | ProbeOutcome::Malformed(_) => None,
        }
    }
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, processor: ProcessorName) -> ProbeOutcome;
}

#[async_trait]
pub trait PaymentTransport: Send + Sync {
    /// One submission attempt. `Ok` only for a 2xx status.
    async fn submit(
        &self,
        processor: ProcessorName,
        request: &ProcessorPaymentRequest,
    ) -> ProcessorResult<()>;
}

/// Base URLs of the two processors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorEndpoints {
    pub default_url: String,
    pub fallback_url: String,
}

impl ProcessorEndpoints {
    pub fn new(default_url: impl Into<String>, fallback_url: impl Into<String>) -> Self {
        Self {
            default_url: trim_base(default_url.into()),
            fallback_url: trim_base(fallback_url.into()),
        }
    }

    pub fn base_url(&self, processor: ProcessorName) -> &str {
        match processor {
            ProcessorName::Default => &self.default_url,
            ProcessorName::Fallback => &self.fallback_url,
        }
    }

    pub fn health_url(&self, processor: ProcessorName) -> String {
        format!("{}{}", self.base_url(processor), HEALTH_PATH)
    }

    pub fn payments_url(&self, processor: ProcessorName) -> String {
        format!("{}{}", self.base_url(processor), PAYMENTS_PATH)
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[derive(Clone)]
pub struct ProcessorClient {
    client: Client,
    endpoints: ProcessorEndpoints,
}

impl ProcessorClient {
    /// Every outbound call carries `timeout`.
    pub fn new(endpoints: ProcessorEndpoints, timeout: Duration) -> ProcessorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ProcessorError::RequestBuildError {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;

        Ok(Self { client, endpoints })
    }
}

#[async_trait]
impl HealthProbe for ProcessorClient {
    async fn probe(&self, processor: ProcessorName) -> ProbeOutcome {
        let url = self.endpoints.health_url(processor);

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(processor = %processor, error = %e, "Health probe failed, marking processor as failing");
                return ProbeOutcome::Unreachable(ProcessorHealth::unreachable(Utc::now()));
            }
        };

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(processor = %processor, "Health probe rate limited, keeping cached snapshot");
            return ProbeOutcome::RateLimited;
        }

        let status = response.status();
        match response.json::<HealthCheckResponse>().await {
            Ok(body) => {
                debug!(
                    processor = %processor,
                    failing = body.failing,
                    min_response_time = body.min_response_time,
                    "Health probe succeeded"
                );
                ProbeOutcome::Reported(ProcessorHealth::checked(
                    body.failing,
                    body.min_response_time,
                    Utc::now(),
                ))
            }
            Err(e) => {
                warn!(
                    processor = %processor,
                    status = %status,
                    error = %e,
                    "Could not decode health response, keeping cached snapshot"
                );
                ProbeOutcome::Malformed(ProcessorError::InvalidResponse {
                    processor,
                    message: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl PaymentTransport for ProcessorClient {
    async fn submit(
        &self,
        processor: ProcessorName,
        request: &ProcessorPaymentRequest,
    ) -> ProcessorResult<()> {
        let response = self
            .client
            .post(self.endpoints.payments_url(processor))
            .json(request)
            .send()
            .await
            .map_err(|e| ProcessorError::from_reqwest(processor, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(ProcessorError::UnexpectedStatus {
            processor,
            status: status.as_u16(),
        })
    }
}
