//! HTTP routes

pub mod payments;

use crate::config::ServerConfig;
use crate::health::{HealthChecker, HealthState, HealthStatus};
use crate::services::{PaymentOrchestrator, SummaryAggregator};
use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PaymentOrchestrator>,
    pub aggregator: Arc<SummaryAggregator>,
    pub health_checker: HealthChecker,
}

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/payments", post(payments::create_payment))
        .route("/payments-summary", get(payments::payments_summary))
        .route("/health", get(health))
        .with_state(state)
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if server.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// 200 while at least one processor is usable, 503 otherwise.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    debug!("Health check requested");
    let status = state.health_checker.check_health().await;

    let code = match status.status {
        HealthState::Healthy | HealthState::Degraded => StatusCode::OK,
        HealthState::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(status))
}
