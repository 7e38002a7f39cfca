pub mod client;
pub mod error;
pub mod types;

pub use client::{
    HealthProbe, PaymentTransport, ProbeOutcome, ProcessorClient, ProcessorEndpoints,
};
pub use error::{ProcessorError, ProcessorResult};
pub use types::{
    HealthCheckResponse, Payment, PaymentsSummary, ProcessorHealth, ProcessorName,
    ProcessorPaymentRequest, ProcessorSummary,
};
