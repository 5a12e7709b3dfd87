//! Order route handlers: courier assignment and per-order fraud checks.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use parcelhub_core::OrderId;
use serde::Deserialize;
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiResponse};
use crate::error::AppError;
use crate::middleware::RequireAdminToken;
use crate::services::{Assignment, FraudVerdict};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders/{id}/courier", post(assign_courier))
        .route("/api/orders/{id}/fraud-check", get(fraud_check))
}

/// Courier assignment request body.
#[derive(Debug, Default, Deserialize)]
pub struct AssignCourierInput {
    /// Free-text courier name.
    #[serde(default, alias = "provider")]
    pub courier: String,
}

/// POST /api/orders/{id}/courier - Assign a courier and mark shipped.
#[instrument(skip(state))]
async fn assign_courier(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<AssignCourierInput>,
) -> Result<Json<ApiResponse<Assignment>>, AppError> {
    let assignment = state
        .assignment()
        .assign(OrderId::new(id), &input.courier)
        .await?;

    Ok(ApiResponse::success("Courier assigned", assignment))
}

/// GET /api/orders/{id}/fraud-check - Screen an order's customer.
#[instrument(skip(state))]
async fn fraud_check(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<FraudVerdict>>, AppError> {
    let verdict = state.fraud().evaluate_by_order(OrderId::new(id)).await?;
    let message = verdict.summary();

    Ok(ApiResponse::success(message, verdict))
}
