//! Payment Orchestrator Service
//!
//! Runs each accepted payment through select, deliver, fail over and record,
//! on its own task and after the caller has been acknowledged. A payment ends
//! either delivered by exactly one processor or dropped.

use crate::processors::{Payment, ProcessorName, ProcessorPaymentRequest};
use crate::services::delivery::DeliverySender;
use crate::services::health_cache::HealthCache;
use crate::services::selector::ProcessorSelector;
use crate::services::summary::SummaryAggregator;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

// ============================================================================
// Outcome
// ============================================================================

/// Terminal state of one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Delivered(ProcessorName),
    Dropped,
}

impl PaymentOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, PaymentOutcome::Delivered(_))
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct PaymentOrchestrator {
    selector: ProcessorSelector,
    sender: DeliverySender,
    aggregator: Arc<SummaryAggregator>,
}

impl PaymentOrchestrator {
    pub fn new(
        health: Arc<HealthCache>,
        sender: DeliverySender,
        aggregator: Arc<SummaryAggregator>,
    ) -> Self {
        Self {
            selector: ProcessorSelector::new(health),
            sender,
            aggregator,
        }
    }

    /// Starts processing on a new task and returns at once.
    ///
    /// The handle is only for callers that want the outcome (tests); the HTTP
    /// path drops it.
    pub fn dispatch(self: &Arc<Self>, payment: Payment) -> JoinHandle<PaymentOutcome> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.process(payment).await })
    }

    /// Runs one payment to completion on the current task.
    pub async fn process(&self, payment: Payment) -> PaymentOutcome {
        // Stamped once so a failover resubmits the same body.
        let request = ProcessorPaymentRequest::new(&payment, Utc::now());

        let selected = self.selector.select().await;
        debug!(
            correlation_id = %payment.correlation_id,
            processor = %selected,
            "Processor selected"
        );

        let delivered_by = if self.sender.send(selected, &request).await {
            Some(selected)
        } else {
            self.fail_over(selected, &request).await
        };

        match delivered_by {
            Some(processor) => {
                self.aggregator.record(processor, payment.amount).await;
                info!(
                    correlation_id = %payment.correlation_id,
                    processor = %processor,
                    amount = payment.amount,
                    "Payment delivered"
                );
                PaymentOutcome::Delivered(processor)
            }
            None => {
                error!(
                    correlation_id = %payment.correlation_id,
                    amount = payment.amount,
                    first_choice = %selected,
                    "Payment dropped, no processor accepted it"
                );
                PaymentOutcome::Dropped
            }
        }
    }

    /// One delivery against the failover target, if the failed processor has one.
    async fn fail_over(
        &self,
        failed: ProcessorName,
        request: &ProcessorPaymentRequest,
    ) -> Option<ProcessorName> {
        let target = failed.failover_target()?;

        info!(
            correlation_id = %request.correlation_id,
            from = %failed,
            to = %target,
            "Failing over payment"
        );

        self.sender.send(target, request).await.then_some(target)
    }
}
