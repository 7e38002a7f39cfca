//! Payment gateway in front of a primary and a fallback payment processor.
//!
//! Payments are acknowledged immediately and processed on their own task:
//! the primary is chosen unless its cached health says it is failing,
//! delivery is retried with exponential backoff, a failed primary delivery
//! fails over once to the fallback, and successful deliveries are counted
//! per processor.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod processors;
pub mod services;
