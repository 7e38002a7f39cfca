//! Delivery of one payment to one named processor with bounded retries.
//!
//! The sender knows nothing about failover between processors; it answers
//! only "did this processor accept the payment".

use crate::processors::{PaymentTransport, ProcessorName, ProcessorPaymentRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Attempt bound and exponential backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Wait after the 0-indexed `attempt` fails: `base * 2^attempt`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Delay between attempts.
#[async_trait]
pub trait Backoff: Send + Sync {
    async fn wait(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioBackoff;

#[async_trait]
impl Backoff for TokioBackoff {
    async fn wait(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

#[async_trait]
impl Backoff for NoBackoff {
    async fn wait(&self, _delay: Duration) {}
}

#[derive(Clone)]
pub struct DeliverySender {
    transport: Arc<dyn PaymentTransport>,
    policy: RetryPolicy,
    backoff: Arc<dyn Backoff>,
}

impl DeliverySender {
    pub fn new(
        transport: Arc<dyn PaymentTransport>,
        policy: RetryPolicy,
        backoff: Arc<dyn Backoff>,
    ) -> Self {
        Self {
            transport,
            policy,
            backoff,
        }
    }

    /// `true` on the first 2xx; `false` once every attempt has failed or a
    /// failure is not worth retrying.
    pub async fn send(&self, processor: ProcessorName, request: &ProcessorPaymentRequest) -> bool {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 0..max_attempts {
            match self.transport.submit(processor, request).await {
                Ok(()) => {
                    debug!(
                        processor = %processor,
                        correlation_id = %request.correlation_id,
                        attempt = attempt + 1,
                        "Payment accepted by processor"
                    );
                    return true;
                }
                Err(e) => {
                    warn!(
                        processor = %processor,
                        correlation_id = %request.correlation_id,
                        attempt = attempt + 1,
                        max_attempts = max_attempts,
                        error = %e,
                        "Payment delivery attempt failed"
                    );

                    if !e.is_retryable() {
                        return false;
                    }
                    if attempt + 1 < max_attempts {
                        self.backoff.wait(self.policy.backoff_for(attempt)).await;
                    }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{Payment, ProcessorError, ProcessorResult};
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Replays scripted results; once exhausted every call fails with 500.
    struct ScriptedTransport {
        script: Mutex<VecDeque<ProcessorResult<()>>>,
        calls: Mutex<Vec<ProcessorName>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<ProcessorResult<()>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PaymentTransport for ScriptedTransport {
        async fn submit(
            &self,
            processor: ProcessorName,
            _request: &ProcessorPaymentRequest,
        ) -> ProcessorResult<()> {
            self.calls.lock().unwrap().push(processor);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(server_error(processor)))
        }
    }

    #[derive(Default)]
    struct RecordingBackoff {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Backoff for RecordingBackoff {
        async fn wait(&self, delay: Duration) {
            self.waits.lock().unwrap().push(delay);
        }
    }

    fn server_error(processor: ProcessorName) -> ProcessorError {
        ProcessorError::UnexpectedStatus {
            processor,
            status: 500,
        }
    }

    fn request() -> ProcessorPaymentRequest {
        let payment = Payment {
            correlation_id: Uuid::new_v4(),
            amount: 19.9,
        };
        ProcessorPaymentRequest::new(&payment, Utc::now())
    }

    fn sender(
        transport: Arc<ScriptedTransport>,
    ) -> (DeliverySender, Arc<RecordingBackoff>) {
        let backoff = Arc::new(RecordingBackoff::default());
        let sender = DeliverySender::new(transport, RetryPolicy::default(), backoff.clone());
        (sender, backoff)
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(4));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff_for(40) >= policy.backoff_for(31));
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let transport = ScriptedTransport::new(vec![Ok(())]);
        let (sender, backoff) = sender(transport.clone());

        assert!(sender.send(ProcessorName::Default, &request()).await);
        assert_eq!(transport.call_count(), 1);
        assert!(backoff.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_on_third_attempt_waits_one_then_two_seconds() {
        let transport = ScriptedTransport::new(vec![
            Err(server_error(ProcessorName::Default)),
            Err(ProcessorError::Timeout {
                processor: ProcessorName::Default,
            }),
            Ok(()),
        ]);
        let (sender, backoff) = sender(transport.clone());

        assert!(sender.send(ProcessorName::Default, &request()).await);
        assert_eq!(transport.call_count(), 3);
        assert_eq!(
            *backoff.waits.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn gives_up_after_three_attempts_without_trailing_wait() {
        let transport = ScriptedTransport::new(vec![]);
        let (sender, backoff) = sender(transport.clone());

        assert!(!sender.send(ProcessorName::Fallback, &request()).await);
        assert_eq!(transport.call_count(), 3);
        assert_eq!(backoff.waits.lock().unwrap().len(), 2);
        assert!(transport
            .calls
            .lock()
            .unwrap()
            .iter()
            .all(|p| *p == ProcessorName::Fallback));
    }

    #[tokio::test]
    async fn unretryable_failure_stops_immediately() {
        let transport = ScriptedTransport::new(vec![Err(ProcessorError::RequestBuildError {
            message: "builder error".to_string(),
        })]);
        let (sender, backoff) = sender(transport.clone());

        assert!(!sender.send(ProcessorName::Default, &request()).await);
        assert_eq!(transport.call_count(), 1);
        assert!(backoff.waits.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_backoff_sleeps_for_the_requested_delay() {
        let start = tokio::time::Instant::now();
        TokioBackoff.wait(Duration::from_secs(2)).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
