//! Per-processor delivery totals

use crate::cache::SummaryStore;
use crate::processors::{PaymentsSummary, ProcessorName, ProcessorSummary};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Clone)]
pub struct SummaryAggregator {
    store: Arc<dyn SummaryStore>,
}

impl SummaryAggregator {
    pub fn new(store: Arc<dyn SummaryStore>) -> Self {
        Self { store }
    }

    /// Counts one delivered payment. Store failures are logged and not retried.
    pub async fn record(&self, processor: ProcessorName, amount: f64) {
        match self.store.increment(processor, amount).await {
            Ok(()) => debug!(processor = %processor, amount = amount, "Payment recorded"),
            Err(e) => error!(
                processor = %processor,
                amount = amount,
                store = self.store.name(),
                error = %e,
                "Failed to record delivered payment"
            ),
        }
    }

    /// Both totals for one processor; zero when nothing is recorded or the
    /// store cannot be read.
    pub async fn read_summary(&self, processor: ProcessorName) -> ProcessorSummary {
        self.store.read(processor).await.unwrap_or_else(|e| {
            error!(
                processor = %processor,
                store = self.store.name(),
                error = %e,
                "Failed to read payment summary, reporting zero"
            );
            ProcessorSummary::default()
        })
    }

    pub async fn payments_summary(&self) -> PaymentsSummary {
        let (default, fallback) = futures::join!(
            self.read_summary(ProcessorName::Default),
            self.read_summary(ProcessorName::Fallback)
        );
        PaymentsSummary { default, fallback }
    }
}
