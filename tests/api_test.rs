//! HTTP boundary tests
//!
//! Routes are driven with `tower::ServiceExt::oneshot`; processors are
//! simulated with wiremock so accepted payments have somewhere to go.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use payment_gateway::api::{self, AppState};
use payment_gateway::cache::{InMemorySummaryStore, SummaryStore};
use payment_gateway::config::ServerConfig;
use payment_gateway::health::HealthChecker;
use payment_gateway::processors::{ProcessorClient, ProcessorEndpoints, ProcessorName};
use payment_gateway::services::{
    DeliverySender, HealthCache, NoBackoff, PaymentOrchestrator, RetryPolicy, SummaryAggregator,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    router: Router,
    store: Arc<InMemorySummaryStore>,
    _default: MockServer,
    _fallback: MockServer,
}

async fn test_app() -> TestApp {
    let default = MockServer::start().await;
    let fallback = MockServer::start().await;
    for server in [&default, &fallback] {
        Mock::given(method("GET"))
            .and(path("/payments/service-health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"failing": false, "minResponseTime": 5})),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    let client = Arc::new(
        ProcessorClient::new(
            ProcessorEndpoints::new(default.uri(), fallback.uri()),
            Duration::from_secs(2),
        )
        .unwrap(),
    );
    let health = Arc::new(HealthCache::new(client.clone(), Duration::from_secs(5)));
    let store = Arc::new(InMemorySummaryStore::new());
    let aggregator = Arc::new(SummaryAggregator::new(store.clone()));
    let sender = DeliverySender::new(client, RetryPolicy::default(), Arc::new(NoBackoff));
    let orchestrator = Arc::new(PaymentOrchestrator::new(
        health.clone(),
        sender,
        aggregator.clone(),
    ));

    let state = AppState {
        orchestrator,
        aggregator,
        health_checker: HealthChecker::new(health, store.clone()),
    };
    let server = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        cors_allowed_origins: vec!["*".to_string()],
    };

    TestApp {
        router: api::router(state, &server),
        store,
        _default: default,
        _fallback: fallback,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_payment(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/payments")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_valid_payment_is_acknowledged() {
    let app = test_app().await;

    let response = app
        .router
        .oneshot(post_payment(json!({
            "correlationId": "4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3",
            "amount": 19.9
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"message": "payment received"}));
}

#[tokio::test]
async fn test_accepted_payment_is_eventually_counted() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_payment(json!({
            "correlationId": "0b0f6b2e-2f42-4c0a-9f0c-1b0e1c2d3e4f",
            "amount": 10.0
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut delivered = false;
    for _ in 0..50 {
        if app.store.read(ProcessorName::Default).await.unwrap().total_requests == 1 {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(delivered, "payment was not recorded");

    let summary = body_json(app.router.oneshot(get("/payments-summary")).await.unwrap()).await;
    assert_eq!(summary["default"]["totalRequests"], 1);
    assert_eq!(summary["default"]["totalAmount"], 10.0);
    assert_eq!(summary["fallback"]["totalRequests"], 0);
}

#[tokio::test]
async fn test_invalid_correlation_id_is_rejected() {
    let app = test_app().await;

    let response = app
        .router
        .oneshot(post_payment(json!({"correlationId": "abc", "amount": 19.9})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_missing_amount_is_rejected() {
    let app = test_app().await;

    let response = app
        .router
        .oneshot(post_payment(json!({
            "correlationId": "4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/payments")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_summary_reads_zero_and_ignores_range() {
    let app = test_app().await;

    let response = app
        .router
        .oneshot(get(
            "/payments-summary?from=2020-07-10T12:34:56.000Z&to=2020-07-10T12:35:56.000Z",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "default": {"totalRequests": 0, "totalAmount": 0.0},
            "fallback": {"totalRequests": 0, "totalAmount": 0.0}
        })
    );
}

#[tokio::test]
async fn test_health_reports_processors_and_store() {
    let app = test_app().await;

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Degraded");
    assert!(body["checks"]["processor_default"].is_object());
    assert!(body["checks"]["processor_fallback"].is_object());
    assert_eq!(body["checks"]["summary_store"]["status"], "Warning");
}

#[tokio::test]
async fn test_cors_preflight_is_permissive() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/payments")
        .header("origin", "http://example.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
