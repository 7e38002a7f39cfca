//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over `LOG_LEVEL` when it is set. `LOG_FORMAT=json`
//! emits one JSON object per event for log aggregation; anything else emits
//! the compact human-readable format.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Calling it twice is harmless; the second
/// call reports the conflict on stderr and keeps the first subscriber.
pub fn init_tracing(config: &LoggingConfig) {
    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter(&config.level))
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .flatten_event(true),
            )
            .try_init(),
        LogFormat::Plain => tracing_subscriber::registry()
            .with(env_filter(&config.level))
            .with(fmt::layer().compact().with_target(true).with_thread_ids(false))
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already initialized: {}", e);
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)))
}

/// Our crate at the configured level, HTTP plumbing one notch quieter.
fn default_directive(level: &str) -> String {
    let level = level.to_lowercase();
    format!(
        "{level},payment_gateway={level},hyper=warn,reqwest=warn,tower_http={level}",
        level = level
    )
}
