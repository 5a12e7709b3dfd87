//! Ad-hoc fraud check.

use axum::{Json, Router, extract::State, routing::post};
use tracing::instrument;

use super::{ApiJson, ApiResponse};
use crate::error::AppError;
use crate::middleware::RequireAdminToken;
use crate::services::{FraudQuery, FraudVerdict};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/fraud-check", post(check))
}

/// POST /api/fraud-check - Screen a phone, IP and/or email.
#[instrument(skip(state, query))]
async fn check(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(query): ApiJson<FraudQuery>,
) -> Result<Json<ApiResponse<FraudVerdict>>, AppError> {
    let verdict = state.fraud().evaluate(&query).await?;
    let message = verdict.summary();

    Ok(ApiResponse::success(message, verdict))
}
