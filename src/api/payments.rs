//! POST /payments and GET /payments-summary

use crate::api::AppState;
use crate::error::AppError;
use crate::processors::{Payment, PaymentsSummary};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Inbound body. Fields are optional so a missing one is reported by name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub correlation_id: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentAccepted {
    pub message: String,
}

/// Accepted and ignored; summaries are always all-time.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl CreatePaymentRequest {
    pub fn into_payment(self) -> Result<Payment, AppError> {
        let raw_id = self
            .correlation_id
            .ok_or_else(|| AppError::validation("correlationId", "is required"))?;
        let correlation_id = Uuid::parse_str(raw_id.trim())
            .map_err(|_| AppError::validation("correlationId", "must be a UUID"))?;

        let amount = self
            .amount
            .ok_or_else(|| AppError::validation("amount", "is required"))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AppError::validation(
                "amount",
                "must be a positive number",
            ));
        }

        Ok(Payment {
            correlation_id,
            amount,
        })
    }
}

/// Acknowledges before the payment is processed.
pub async fn create_payment(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<Json<PaymentAccepted>, AppError> {
    let Json(request) = body?;
    let payment = request.into_payment()?;

    info!(
        correlation_id = %payment.correlation_id,
        amount = payment.amount,
        "Payment received"
    );

    // Fire and forget: the handle is dropped, the task keeps running.
    let _ = state.orchestrator.dispatch(payment);

    Ok(Json(PaymentAccepted {
        message: "payment received".to_string(),
    }))
}

pub async fn payments_summary(
    State(state): State<AppState>,
    Query(range): Query<SummaryRange>,
) -> Json<PaymentsSummary> {
    if range.from.is_some() || range.to.is_some() {
        debug!(from = ?range.from, to = ?range.to, "Ignoring summary time range");
    }

    Json(state.aggregator.payments_summary().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(correlation_id: Option<&str>, amount: Option<f64>) -> CreatePaymentRequest {
        CreatePaymentRequest {
            correlation_id: correlation_id.map(str::to_string),
            amount,
        }
    }

    #[test]
    fn valid_request_becomes_payment() {
        let id = "4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3";
        let payment = request(Some(id), Some(19.9)).into_payment().unwrap();
        assert_eq!(payment.correlation_id.to_string(), id);
        assert_eq!(payment.amount, 19.9);
    }

    #[test]
    fn rejects_missing_and_malformed_fields() {
        let id = "4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3";
        assert!(request(None, Some(1.0)).into_payment().is_err());
        assert!(request(Some("not-a-uuid"), Some(1.0)).into_payment().is_err());
        assert!(request(Some(id), None).into_payment().is_err());
        assert!(request(Some(id), Some(0.0)).into_payment().is_err());
        assert!(request(Some(id), Some(-3.5)).into_payment().is_err());
        assert!(request(Some(id), Some(f64::NAN)).into_payment().is_err());
    }

    #[test]
    fn body_uses_camel_case() {
        let parsed: CreatePaymentRequest = serde_json::from_str(
            r#"{"correlationId":"4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3","amount":19.9}"#,
        )
        .unwrap();
        assert!(parsed.correlation_id.is_some());
        assert_eq!(parsed.amount, Some(19.9));
    }
}
