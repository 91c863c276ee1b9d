use std::sync::Arc;

use application::usecases::record_payment::{
    PaymentApplication, RecordPaymentError, RecordPaymentParams, RecordPaymentUseCase,
};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::{axum_http::routers::authorize_bearer, config::config_model::DotEnvyConfig};

#[derive(Clone)]
pub struct PaymentRouteState {
    config: Arc<DotEnvyConfig>,
    usecase: Arc<RecordPaymentUseCase>,
}

pub fn routes(config: Arc<DotEnvyConfig>, usecase: Arc<RecordPaymentUseCase>) -> Router {
    Router::new()
        .route("/confirm", post(confirm_payment))
        .with_state(PaymentRouteState { config, usecase })
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub invoice_id: Uuid,
    pub amount_minor: i32,
    pub method: String,
    pub gateway: Option<String>,
    pub transaction_id: String,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub payment_id: Uuid,
    pub already_applied: bool,
}

pub async fn confirm_payment(
    State(state): State<PaymentRouteState>,
    headers: HeaderMap,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Response {
    let expected_token = match state.config.sweep.internal_token.as_deref() {
        Some(token) => token,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "internal API token is not configured",
            )
                .into_response();
        }
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return (status, "unauthorized").into_response();
    }

    let params = RecordPaymentParams {
        invoice_id: payload.invoice_id,
        amount_minor: payload.amount_minor,
        method: payload.method,
        gateway: payload.gateway,
        transaction_id: payload.transaction_id,
        paid_at: payload.paid_at.unwrap_or_else(Utc::now),
    };

    match state.usecase.run(params).await {
        Ok(PaymentApplication::Applied { payment_id }) => Json(ConfirmPaymentResponse {
            payment_id,
            already_applied: false,
        })
        .into_response(),
        Ok(PaymentApplication::AlreadyApplied { payment_id }) => Json(ConfirmPaymentResponse {
            payment_id,
            already_applied: true,
        })
        .into_response(),
        Err(err) => {
            let status = match &err {
                RecordPaymentError::InvoiceNotFound => StatusCode::NOT_FOUND,
                RecordPaymentError::InvoiceCancelled => StatusCode::CONFLICT,
                RecordPaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!(error = ?err, "payments: confirmation failed");
            }
            (status, err.to_string()).into_response()
        }
    }
}
