//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                    - Liveness
//! GET  /health/ready                              - Readiness (database)
//!
//! # Geography lookups (public)
//! GET  /api/couriers/pathao/cities
//! GET  /api/couriers/pathao/cities/{id}/zones
//! GET  /api/couriers/pathao/zones/{id}/areas
//! GET  /api/couriers/redx/areas?post_code=&district_name=
//! GET  /api/couriers/ecourier/cities
//! GET  /api/couriers/ecourier/thanas?city=
//! GET  /api/couriers/ecourier/postcodes?city=&thana=
//! GET  /api/couriers/ecourier/areas?postcode=
//!
//! # Couriers (bearer token)
//! POST /api/couriers/{provider}/orders            - Place a shipment
//! GET  /api/couriers/balance/{provider}           - Account balance
//! POST /api/couriers/steadfast/orders/bulk
//! GET  /api/couriers/steadfast/status/{kind}/{id}
//! POST /api/couriers/pathao/token
//! GET|POST /api/couriers/pathao/stores
//! GET  /api/couriers/pathao/orders/{consignment_id}
//! POST /api/couriers/pathao/price-plan
//! GET|POST /api/couriers/redx/stores
//! GET  /api/couriers/redx/parcels/{id}/track
//! GET  /api/couriers/redx/parcels/{id}/info
//! POST /api/couriers/redx/parcels/{id}/cancel
//! POST /api/couriers/paperfly/track
//! POST /api/couriers/paperfly/cancel
//! POST /api/couriers/ecourier/track
//! POST /api/couriers/ecourier/cancel
//! GET  /api/couriers/ecourier/packages
//!
//! # Orders, fraud, blacklist (bearer token)
//! POST /api/orders/{id}/courier                   - Assign courier
//! GET  /api/orders/{id}/fraud-check
//! POST /api/fraud-check
//! GET|POST /api/blacklist
//! DELETE /api/blacklist/{id}
//! ```

pub mod blacklist;
pub mod couriers;
pub mod fraud;
pub mod health;
pub mod orders;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Path, Query},
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

// =============================================================================
// Shared Types
// =============================================================================

/// Success envelope. Errors use the same `status`/`message` shape (see
/// [`AppError`]).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
            data: None,
        })
    }
}

/// `Json` whose rejection renders as an [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejection renders as an [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `Query` whose rejection renders as an [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(couriers::router())
        .merge(orders::router())
        .merge(fraud::router())
        .merge(blacklist::router())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CourierRuntimeConfig;
    use crate::db::{
        InMemoryBlacklistStore, InMemoryOrderStore, InMemorySettingsStore, InMemoryUserStore,
    };
    use crate::state::Stores;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    const TOKEN: &str = "k7Qp2Zx9Lm4Rt8Vw1Ys6Bn3Hc5Jd0Fg";

    fn app() -> Router {
        let stores = Stores {
            settings: Arc::new(InMemorySettingsStore::new()),
            orders: Arc::new(InMemoryOrderStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            blacklist: Arc::new(InMemoryBlacklistStore::new()),
        };
        let state = AppState::from_parts(
            &SecretString::from(TOKEN),
            None,
            stores,
            CourierRuntimeConfig::default(),
        )
        .unwrap();
        routes().with_state(state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn test_readiness_without_pool() {
        let request = Request::get("/health/ready").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_admin_route_requires_token() {
        let request = Request::get("/api/blacklist").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "error");

        let request = Request::get("/api/blacklist")
            .header(header::AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_geography_without_credentials_is_not_configured() {
        let request = Request::get("/api/couriers/pathao/cities")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "not_configured");
    }

    #[tokio::test]
    async fn test_blacklist_create_normalizes_and_rejects_duplicates() {
        let app = app();

        let (status, body) = send(
            app.clone(),
            authed(
                "POST",
                "/api/blacklist",
                Some(json!({"type": "phone", "value": "+88 01700-000000", "reason": "chargeback"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["value"], "01700000000");

        let (status, body) = send(
            app.clone(),
            authed(
                "POST",
                "/api/blacklist",
                Some(json!({"type": "phone", "value": "01700000000"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "error");

        let (status, body) = send(app, authed("GET", "/api/blacklist", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request_envelope() {
        let request = Request::post("/api/fraud-check")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_assign_courier_empty_provider() {
        let (status, body) = send(
            app(),
            authed("POST", "/api/orders/1/courier", Some(json!({"courier": "  "}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Bad request: courier provider is required");
    }

    #[tokio::test]
    async fn test_balance_placeholder() {
        let (status, body) = send(app(), authed("GET", "/api/couriers/balance/pathao", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["current_balance"], 0);
        assert_eq!(body["message"], "Balance check not supported for pathao");
    }
}
