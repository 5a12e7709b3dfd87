//! Paperfly routes.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAdminToken;
use crate::routes::{ApiJson, ApiResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/couriers/paperfly/track", post(track))
        .route("/api/couriers/paperfly/cancel", post(cancel))
}

#[derive(Debug, Deserialize)]
pub struct TrackInput {
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelInput {
    pub order_id: String,
}

fn required<'a>(value: &'a str, name: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{name} is required")));
    }
    Ok(value)
}

#[instrument(skip(state, input), fields(reference = %input.reference))]
async fn track(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(input): ApiJson<TrackInput>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let reference = required(&input.reference, "reference")?;
    let status = state.couriers().paperfly().await?.track_order(reference).await?;
    Ok(ApiResponse::success("Order tracking retrieved", status))
}

#[instrument(skip(state, input), fields(order_id = %input.order_id))]
async fn cancel(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(input): ApiJson<CancelInput>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let order_id = required(&input.order_id, "order_id")?;
    let response = state.couriers().paperfly().await?.cancel_order(order_id).await?;
    Ok(ApiResponse::success("Order cancelled", response))
}
