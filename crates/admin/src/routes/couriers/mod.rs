//! Courier route handlers.
//!
//! Generic shipment creation and balance dispatch live here; the
//! provider-specific operations are in one submodule per provider.

mod ecourier;
mod paperfly;
mod pathao;
mod redx;
mod steadfast;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use parcelhub_core::CourierProvider;
use serde_json::Value;
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiResponse};
use crate::couriers::{CourierOrderRequest, CourierOrderResult};
use crate::error::AppError;
use crate::middleware::RequireAdminToken;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let mut router = Router::new().route("/api/couriers/balance/{provider}", get(balance));

    // One static route per provider keeps `/api/couriers/pathao/...` lookups
    // from competing with a `{provider}` capture.
    for provider in CourierProvider::ALL {
        router = router.route(
            &format!("/api/couriers/{provider}/orders"),
            post(
                move |state: State<AppState>,
                      auth: RequireAdminToken,
                      body: ApiJson<CourierOrderRequest>| {
                    create_shipment(provider, state, auth, body)
                },
            ),
        );
    }

    router
        .merge(steadfast::router())
        .merge(pathao::router())
        .merge(redx::router())
        .merge(paperfly::router())
        .merge(ecourier::router())
}

/// POST /api/couriers/{provider}/orders - Place a shipment.
#[instrument(skip(state, request), fields(invoice = %request.invoice))]
async fn create_shipment(
    provider: CourierProvider,
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(request): ApiJson<CourierOrderRequest>,
) -> Result<Json<ApiResponse<CourierOrderResult>>, AppError> {
    let result = state.couriers().create_shipment(provider, &request).await?;

    Ok(ApiResponse::success(
        format!("{} order created", provider.display_name()),
        result,
    ))
}

/// GET /api/couriers/balance/{provider} - Account balance.
#[instrument(skip(state))]
async fn balance(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiPath(provider): ApiPath<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let balance = state.couriers().check_balance(&provider).await?;
    let message = balance
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Balance retrieved")
        .to_string();

    Ok(ApiResponse::success(message, balance))
}
