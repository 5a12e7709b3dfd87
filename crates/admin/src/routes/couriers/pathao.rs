//! Pathao routes: public geography lookups plus admin store, order and
//! token management.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use parcelhub_core::CourierProvider;
use serde_json::{Value, json};
use tracing::instrument;

use crate::couriers::{COURIER_GROUP, CourierError};
use crate::couriers::pathao::{NewStore, PricePlanRequest, access_token_from};
use crate::error::AppError;
use crate::middleware::RequireAdminToken;
use crate::routes::{ApiJson, ApiPath, ApiResponse};
use crate::state::AppState;

/// Settings key the issued access token is written to.
const ACCESS_TOKEN_KEY: &str = "pathao_access_token";

pub fn router() -> Router<AppState> {
    Router::new()
        // Public
        .route("/api/couriers/pathao/cities", get(cities))
        .route("/api/couriers/pathao/cities/{id}/zones", get(zones))
        .route("/api/couriers/pathao/zones/{id}/areas", get(areas))
        // Admin
        .route("/api/couriers/pathao/token", post(issue_token))
        .route(
            "/api/couriers/pathao/stores",
            get(stores).post(create_store),
        )
        .route("/api/couriers/pathao/orders/{consignment_id}", get(order_info))
        .route("/api/couriers/pathao/price-plan", post(price_plan))
}

// =============================================================================
// Geography
// =============================================================================

#[instrument(skip(state))]
async fn cities(State(state): State<AppState>) -> Result<Json<ApiResponse<Value>>, AppError> {
    let cities = state.couriers().pathao().await?.cities().await?;
    Ok(ApiResponse::success("Cities retrieved", cities))
}

#[instrument(skip(state))]
async fn zones(
    State(state): State<AppState>,
    ApiPath(city_id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let zones = state.couriers().pathao().await?.zones(city_id).await?;
    Ok(ApiResponse::success("Zones retrieved", zones))
}

#[instrument(skip(state))]
async fn areas(
    State(state): State<AppState>,
    ApiPath(zone_id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let areas = state.couriers().pathao().await?.areas(zone_id).await?;
    Ok(ApiResponse::success("Areas retrieved", areas))
}

// =============================================================================
// Admin
// =============================================================================

/// POST /api/couriers/pathao/token - Issue an access token and store it.
///
/// The token itself is not echoed back.
#[instrument(skip(state))]
async fn issue_token(
    State(state): State<AppState>,
    _: RequireAdminToken,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let couriers = state.couriers();
    let response = couriers.pathao().await?.issue_token().await?;

    let token = access_token_from(&response).ok_or_else(|| CourierError::Parse {
        provider: CourierProvider::Pathao,
        message: "token response has no access_token".to_string(),
    })?;

    couriers
        .resolver()
        .upsert(ACCESS_TOKEN_KEY, token, COURIER_GROUP)
        .await?;

    tracing::info!("Pathao access token refreshed");

    Ok(ApiResponse::success(
        "Access token issued and saved",
        json!({
            "token_type": response.get("token_type"),
            "expires_in": response.get("expires_in"),
        }),
    ))
}

#[instrument(skip(state))]
async fn stores(
    State(state): State<AppState>,
    _: RequireAdminToken,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let stores = state.couriers().pathao().await?.stores().await?;
    Ok(ApiResponse::success("Stores retrieved", stores))
}

#[instrument(skip(state, store), fields(store = %store.name))]
async fn create_store(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(store): ApiJson<NewStore>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let response = state.couriers().pathao().await?.create_store(&store).await?;
    Ok(ApiResponse::success("Store created", response))
}

#[instrument(skip(state))]
async fn order_info(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiPath(consignment_id): ApiPath<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let info = state
        .couriers()
        .pathao()
        .await?
        .order_info(&consignment_id)
        .await?;
    Ok(ApiResponse::success("Order info retrieved", info))
}

#[instrument(skip(state, plan))]
async fn price_plan(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(plan): ApiJson<PricePlanRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let price = state.couriers().pathao().await?.price_plan(&plan).await?;
    Ok(ApiResponse::success("Price plan retrieved", price))
}
