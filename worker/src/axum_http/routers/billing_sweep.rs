use std::{sync::Arc, time::Duration};

use application::usecases::billing_sweep::{BillingSweepUseCase, SweepParams};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;

use crate::{axum_http::routers::authorize_bearer, config::config_model::DotEnvyConfig};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/billing/sweep" \
//     -H "Authorization: Bearer $INTERNAL_API_TOKEN" \
//     -H "Content-Type: application/json" \
//     -d '{"dry_run":true,"limit":100}'

#[derive(Clone)]
pub struct SweepRouteState {
    config: Arc<DotEnvyConfig>,
    usecase: Arc<BillingSweepUseCase>,
}

pub fn routes(config: Arc<DotEnvyConfig>, usecase: Arc<BillingSweepUseCase>) -> Router {
    Router::new()
        .route("/sweep", post(run_sweep))
        .with_state(SweepRouteState { config, usecase })
}

#[derive(Debug, Deserialize)]
pub struct RunSweepRequest {
    pub dry_run: Option<bool>,
    pub limit: Option<i64>,
    pub deadline_secs: Option<u64>,
}

pub async fn run_sweep(
    State(state): State<SweepRouteState>,
    headers: HeaderMap,
    Json(payload): Json<RunSweepRequest>,
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

    let mut params = SweepParams::at(Utc::now());
    params.dry_run = payload.dry_run.unwrap_or(false);
    params.limit = payload.limit;
    params.deadline = payload
        .deadline_secs
        .or(state.config.sweep.deadline_secs)
        .map(Duration::from_secs);

    match state.usecase.run(params).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => {
            error!(error = ?err, "billing_sweep: triggered sweep failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "sweep failed").into_response()
        }
    }
}
