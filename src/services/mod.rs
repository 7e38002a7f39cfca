//! Services module for routing, delivery and accounting of payments

pub mod delivery;
pub mod health_cache;
pub mod payment_orchestrator;
pub mod selector;
pub mod summary;

pub use delivery::{Backoff, DeliverySender, NoBackoff, RetryPolicy, TokioBackoff};
pub use health_cache::{HealthCache, DEFAULT_HEALTH_TTL};
pub use payment_orchestrator::{PaymentOrchestrator, PaymentOutcome};
pub use selector::ProcessorSelector;
pub use summary::SummaryAggregator;
