use payment_gateway::api::{self, AppState};
use payment_gateway::cache::connect_summary_store;
use payment_gateway::config::AppConfig;
use payment_gateway::health::HealthChecker;
use payment_gateway::logging::init_tracing;
use payment_gateway::processors::ProcessorClient;
use payment_gateway::services::{
    DeliverySender, HealthCache, PaymentOrchestrator, SummaryAggregator, TokioBackoff,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.logging);

    info!("🚀 Starting payment gateway");

    if let Err(e) = config.validate() {
        error!(error = %e, "❌ Invalid configuration");
        return Err(e.into());
    }

    let processors = &config.processors;
    info!(
        default_url = %processors.default_url,
        fallback_url = %processors.fallback_url,
        timeout_secs = processors.request_timeout,
        "Configuring payment processors"
    );

    let client = Arc::new(ProcessorClient::new(
        processors.endpoints(),
        processors.request_timeout(),
    )?);
    let health_cache = Arc::new(HealthCache::new(client.clone(), processors.health_ttl()));

    // Never fails; falls back to a non-persistent store with one warning.
    let store = connect_summary_store(&config.cache).await;
    info!(store = store.name(), "✅ Summary store ready");

    let aggregator = Arc::new(SummaryAggregator::new(store.clone()));
    let sender = DeliverySender::new(client, processors.retry_policy(), Arc::new(TokioBackoff));
    let orchestrator = Arc::new(PaymentOrchestrator::new(
        health_cache.clone(),
        sender,
        aggregator.clone(),
    ));

    let state = AppState {
        orchestrator,
        aggregator,
        health_checker: HealthChecker::new(health_cache, store),
    };
    let app = api::router(state, &config.server);

    info!("✅ Routes configured");

    let addr: SocketAddr = config.server.bind_address().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");

    Ok(())
}
