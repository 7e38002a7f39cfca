//! Type-safe counter-store key builders

use crate::processors::ProcessorName;
use std::fmt;

pub const NAMESPACE: &str = "summary";

/// Hash field holding the number of delivered payments.
pub const TOTAL_REQUESTS_FIELD: &str = "totalRequests";
/// Hash field holding the sum of delivered amounts.
pub const TOTAL_AMOUNT_FIELD: &str = "totalAmount";

#[derive(Debug, Clone, Copy)]
pub struct SummaryKey {
    pub processor: ProcessorName,
}

impl SummaryKey {
    pub fn new(processor: ProcessorName) -> Self {
        Self { processor }
    }
}

impl fmt::Display for SummaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", NAMESPACE, self.processor)
    }
}
