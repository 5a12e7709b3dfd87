//! eCourier routes: public location lookups plus admin tracking,
//! cancellation and package listing.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAdminToken;
use crate::routes::{ApiJson, ApiQuery, ApiResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Public
        .route("/api/couriers/ecourier/cities", get(cities))
        .route("/api/couriers/ecourier/thanas", get(thanas))
        .route("/api/couriers/ecourier/postcodes", get(postcodes))
        .route("/api/couriers/ecourier/areas", get(areas))
        // Admin
        .route("/api/couriers/ecourier/track", post(track))
        .route("/api/couriers/ecourier/cancel", post(cancel))
        .route("/api/couriers/ecourier/packages", get(packages))
}

// =============================================================================
// Input Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub city: Option<String>,
    pub thana: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackInput {
    pub tracking: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelInput {
    pub tracking: String,
    #[serde(default)]
    pub comment: String,
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

// =============================================================================
// Locations
// =============================================================================

#[instrument(skip(state))]
async fn cities(State(state): State<AppState>) -> Result<Json<ApiResponse<Value>>, AppError> {
    let cities = state.couriers().ecourier().await?.cities().await?;
    Ok(ApiResponse::success("Cities retrieved", cities))
}

#[instrument(skip(state))]
async fn thanas(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LocationQuery>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let city = required(query.city.as_deref(), "city")?;
    let thanas = state.couriers().ecourier().await?.thanas(city).await?;
    Ok(ApiResponse::success("Thanas retrieved", thanas))
}

#[instrument(skip(state))]
async fn postcodes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LocationQuery>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let city = required(query.city.as_deref(), "city")?;
    let thana = required(query.thana.as_deref(), "thana")?;
    let postcodes = state
        .couriers()
        .ecourier()
        .await?
        .postcodes(city, thana)
        .await?;
    Ok(ApiResponse::success("Postcodes retrieved", postcodes))
}

#[instrument(skip(state))]
async fn areas(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LocationQuery>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let postcode = required(query.postcode.as_deref(), "postcode")?;
    let areas = state.couriers().ecourier().await?.areas(postcode).await?;
    Ok(ApiResponse::success("Areas retrieved", areas))
}

// =============================================================================
// Admin
// =============================================================================

#[instrument(skip(state, input), fields(tracking = %input.tracking))]
async fn track(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(input): ApiJson<TrackInput>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let tracking = required(Some(input.tracking.as_str()), "tracking")?;
    let status = state.couriers().ecourier().await?.track(tracking).await?;
    Ok(ApiResponse::success("Tracking retrieved", status))
}

#[instrument(skip(state, input), fields(tracking = %input.tracking))]
async fn cancel(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(input): ApiJson<CancelInput>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let tracking = required(Some(input.tracking.as_str()), "tracking")?;
    let response = state
        .couriers()
        .ecourier()
        .await?
        .cancel_order(tracking, input.comment.trim())
        .await?;
    Ok(ApiResponse::success("Order cancelled", response))
}

#[instrument(skip(state))]
async fn packages(
    State(state): State<AppState>,
    _: RequireAdminToken,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let packages = state.couriers().ecourier().await?.packages().await?;
    Ok(ApiResponse::success("Packages retrieved", packages))
}
