//! RedX routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::couriers::redx::{AreaFilter, NewPickupStore};
use crate::error::AppError;
use crate::middleware::RequireAdminToken;
use crate::routes::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/couriers/redx/areas", get(areas))
        .route(
            "/api/couriers/redx/stores",
            get(pickup_stores).post(create_pickup_store),
        )
        .route("/api/couriers/redx/parcels/{id}/track", get(track))
        .route("/api/couriers/redx/parcels/{id}/info", get(info))
        .route("/api/couriers/redx/parcels/{id}/cancel", post(cancel))
}

/// Cancellation request body.
#[derive(Debug, Deserialize)]
pub struct CancelInput {
    #[serde(default)]
    pub reason: String,
}

/// GET /api/couriers/redx/areas - Public area lookup.
#[instrument(skip(state))]
async fn areas(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<AreaFilter>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let areas = state.couriers().redx().await?.areas(&filter).await?;
    Ok(ApiResponse::success("Areas retrieved", areas))
}

#[instrument(skip(state))]
async fn pickup_stores(
    State(state): State<AppState>,
    _: RequireAdminToken,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let stores = state.couriers().redx().await?.pickup_stores().await?;
    Ok(ApiResponse::success("Pickup stores retrieved", stores))
}

#[instrument(skip(state, store), fields(store = %store.name))]
async fn create_pickup_store(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(store): ApiJson<NewPickupStore>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let response = state
        .couriers()
        .redx()
        .await?
        .create_pickup_store(&store)
        .await?;
    Ok(ApiResponse::success("Pickup store created", response))
}

#[instrument(skip(state))]
async fn track(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiPath(tracking_id): ApiPath<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let events = state.couriers().redx().await?.track_parcel(&tracking_id).await?;
    Ok(ApiResponse::success("Parcel tracking retrieved", events))
}

#[instrument(skip(state))]
async fn info(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiPath(tracking_id): ApiPath<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let info = state.couriers().redx().await?.parcel_info(&tracking_id).await?;
    Ok(ApiResponse::success("Parcel info retrieved", info))
}

#[instrument(skip(state, input))]
async fn cancel(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiPath(tracking_id): ApiPath<String>,
    ApiJson(input): ApiJson<CancelInput>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest("reason is required".to_string()));
    }

    let response = state
        .couriers()
        .redx()
        .await?
        .cancel_parcel(&tracking_id, reason)
        .await?;
    Ok(ApiResponse::success("Parcel cancelled", response))
}
