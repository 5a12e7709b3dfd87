//! Steadfast-specific routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::couriers::CourierOrderRequest;
use crate::couriers::steadfast::StatusLookup;
use crate::error::AppError;
use crate::middleware::RequireAdminToken;
use crate::routes::{ApiJson, ApiPath, ApiResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/couriers/steadfast/orders/bulk", post(bulk_create))
        .route("/api/couriers/steadfast/status/{kind}/{id}", get(status))
}

/// Bulk order request body.
#[derive(Debug, Deserialize)]
pub struct BulkOrdersInput {
    pub orders: Vec<CourierOrderRequest>,
}

/// POST /api/couriers/steadfast/orders/bulk
#[instrument(skip(state, input), fields(count = input.orders.len()))]
async fn bulk_create(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(input): ApiJson<BulkOrdersInput>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    for (index, order) in input.orders.iter().enumerate() {
        order
            .validate()
            .map_err(|e| AppError::BadRequest(format!("order {index}: {e}")))?;
    }

    let response = state
        .couriers()
        .steadfast()
        .await?
        .bulk_create_orders(&input.orders)
        .await?;

    Ok(ApiResponse::success("Bulk order submitted", response))
}

/// GET /api/couriers/steadfast/status/{kind}/{id}
#[instrument(skip(state))]
async fn status(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiPath((kind, id)): ApiPath<(String, String)>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let lookup: StatusLookup = kind.parse()?;
    let response = state.couriers().steadfast().await?.status(lookup, &id).await?;

    Ok(ApiResponse::success("Delivery status retrieved", response))
}
