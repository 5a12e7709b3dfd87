//! Pathao courier merchant API client.
//!
//! OAuth password grant for an access token, then bearer auth on every call.
//! Destinations are hierarchical: city → zone → area IDs resolved through the
//! lookup endpoints before an order can be placed.

use parcelhub_core::CourierProvider;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use super::http::{endpoint, send_json};
use super::settings::PathaoConfig;
use super::{CourierError, CourierOrderRequest, CourierOrderResult};

const PROVIDER: CourierProvider = CourierProvider::Pathao;
const API_PREFIX: &str = "/aladdin/api/v1";

/// Normal (48h) delivery.
pub const DELIVERY_TYPE_NORMAL: u8 = 48;
/// Parcel (as opposed to document, `1`).
pub const ITEM_TYPE_PARCEL: u8 = 2;
/// Weight assumed when the request carries none, in kilograms.
const DEFAULT_WEIGHT_KG: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Pathao API client.
#[derive(Debug, Clone)]
pub struct PathaoClient {
    http: reqwest::Client,
    config: PathaoConfig,
}

/// Pickup store registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStore {
    pub name: String,
    pub contact_name: String,
    pub contact_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_contact: Option<String>,
    pub address: String,
    pub city_id: i64,
    pub zone_id: i64,
    pub area_id: i64,
}

/// Delivery price estimate input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePlanRequest {
    /// Defaults to `pathao_store_id` when omitted.
    #[serde(default)]
    pub store_id: Option<i64>,
    #[serde(default = "default_item_type")]
    pub item_type: u8,
    #[serde(default = "default_delivery_type")]
    pub delivery_type: u8,
    #[serde(with = "rust_decimal::serde::float")]
    pub item_weight: Decimal,
    pub recipient_city: i64,
    pub recipient_zone: i64,
}

const fn default_item_type() -> u8 {
    ITEM_TYPE_PARCEL
}

const fn default_delivery_type() -> u8 {
    DELIVERY_TYPE_NORMAL
}

#[derive(Debug, Serialize)]
struct OrderPayload<'a> {
    store_id: i64,
    merchant_order_id: &'a str,
    recipient_name: &'a str,
    recipient_phone: &'a str,
    recipient_address: &'a str,
    recipient_city: i64,
    recipient_zone: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipient_area: Option<i64>,
    delivery_type: u8,
    item_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    special_instruction: Option<&'a str>,
    item_quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    item_weight: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    amount_to_collect: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_description: Option<&'a str>,
}

/// Pull `access_token` out of an `issue_token` response.
#[must_use]
pub fn access_token_from(response: &Value) -> Option<&str> {
    response
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}

impl PathaoClient {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: PathaoConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.config.base_url, &format!("{API_PREFIX}{path}"))
    }

    fn authorized(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, CourierError> {
        let token = self.config.require_token()?;
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(token.expose_secret()))
    }

    fn store_id(&self, explicit: Option<i64>) -> Result<i64, CourierError> {
        if let Some(id) = explicit {
            return Ok(id);
        }
        let raw = self
            .config
            .store_id
            .as_deref()
            .ok_or(CourierError::NotConfigured {
                provider: PROVIDER,
                key: "pathao_store_id",
            })?;
        raw.parse().map_err(|_| {
            CourierError::Validation(format!("pathao_store_id is not numeric: {raw}"))
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange the stored client/user credentials for an access token.
    ///
    /// Returns the raw token response; the caller persists `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` naming the first missing credential.
    #[instrument(skip(self))]
    pub async fn issue_token(&self) -> Result<Value, CourierError> {
        let grant = self.config.require_grant()?;
        let body = json!({
            "client_id": grant.client_id,
            "client_secret": grant.client_secret.expose_secret(),
            "username": grant.username,
            "password": grant.password.expose_secret(),
            "grant_type": "password",
        });

        let request = self.http.post(self.url("/issue-token")).json(&body);
        send_json(PROVIDER, request).await
    }

    // =========================================================================
    // Geography
    // =========================================================================

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn cities(&self) -> Result<Value, CourierError> {
        send_json(PROVIDER, self.authorized(reqwest::Method::GET, "/city-list")?).await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn zones(&self, city_id: i64) -> Result<Value, CourierError> {
        let path = format!("/cities/{city_id}/zone-list");
        send_json(PROVIDER, self.authorized(reqwest::Method::GET, &path)?).await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn areas(&self, zone_id: i64) -> Result<Value, CourierError> {
        let path = format!("/zones/{zone_id}/area-list");
        send_json(PROVIDER, self.authorized(reqwest::Method::GET, &path)?).await
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self, store), fields(name = %store.name))]
    pub async fn create_store(&self, store: &NewStore) -> Result<Value, CourierError> {
        let builder = self.authorized(reqwest::Method::POST, "/stores")?;
        send_json(PROVIDER, builder.json(store)).await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn stores(&self) -> Result<Value, CourierError> {
        send_json(PROVIDER, self.authorized(reqwest::Method::GET, "/stores")?).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order. Tracking code comes from `data.consignment_id`.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Validation` when the destination city/zone is
    /// missing and `CourierError::NotConfigured` without a token or store.
    #[instrument(skip(self, request), fields(invoice = %request.invoice))]
    pub async fn create_order(
        &self,
        request: &CourierOrderRequest,
    ) -> Result<CourierOrderResult, CourierError> {
        self.config.require_token()?;

        let dest = &request.destination;
        let (Some(city), Some(zone)) = (dest.city_id, dest.zone_id) else {
            return Err(CourierError::Validation(
                "Pathao orders require destination city_id and zone_id".to_string(),
            ));
        };

        let payload = OrderPayload {
            store_id: self.store_id(dest.store_id)?,
            merchant_order_id: &request.invoice,
            recipient_name: &request.recipient_name,
            recipient_phone: &request.recipient_phone,
            recipient_address: &request.recipient_address,
            recipient_city: city,
            recipient_zone: zone,
            recipient_area: dest.area_id,
            delivery_type: DELIVERY_TYPE_NORMAL,
            item_type: ITEM_TYPE_PARCEL,
            special_instruction: request.note.as_deref(),
            item_quantity: request.quantity(),
            item_weight: request.weight.unwrap_or(DEFAULT_WEIGHT_KG),
            amount_to_collect: request.cod_amount,
            item_description: request.item_description.as_deref(),
        };

        let builder = self.authorized(reqwest::Method::POST, "/orders")?;
        let raw = send_json(PROVIDER, builder.json(&payload)).await?;
        Ok(CourierOrderResult::from_response(
            PROVIDER,
            raw,
            "/data/consignment_id",
        ))
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn order_info(&self, consignment_id: &str) -> Result<Value, CourierError> {
        let path = format!("/orders/{}/info", urlencoding::encode(consignment_id));
        send_json(PROVIDER, self.authorized(reqwest::Method::GET, &path)?).await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without a token or store.
    #[instrument(skip(self, plan))]
    pub async fn price_plan(&self, plan: &PricePlanRequest) -> Result<Value, CourierError> {
        let mut plan = plan.clone();
        plan.store_id = Some(self.store_id(plan.store_id)?);

        let builder = self.authorized(reqwest::Method::POST, "/merchant/price-plan")?;
        send_json(PROVIDER, builder.json(&plan)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::couriers::Destination;
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use std::time::Duration;

    fn config(base_url: &str) -> PathaoConfig {
        PathaoConfig {
            base_url: base_url.to_string(),
            client_id: Some("client-1".to_string()),
            client_secret: Some(SecretString::from("client-secret".to_string())),
            username: Some("ops@example.com".to_string()),
            password: Some(SecretString::from("hunter22".to_string())),
            access_token: Some(SecretString::from("tok-abc".to_string())),
            store_id: Some("1201".to_string()),
        }
    }

    fn client(config: PathaoConfig) -> PathaoClient {
        let http = crate::couriers::http::build_client(Duration::from_secs(5)).unwrap();
        PathaoClient::new(http, config)
    }

    fn order() -> CourierOrderRequest {
        CourierOrderRequest {
            invoice: "INV-2002".to_string(),
            recipient_name: "Karim".to_string(),
            recipient_phone: "01811111111".to_string(),
            recipient_address: "Mirpur 10".to_string(),
            cod_amount: Decimal::from(900),
            destination: Destination {
                city_id: Some(1),
                zone_id: Some(52),
                ..Destination::default()
            },
            ..CourierOrderRequest::default()
        }
    }

    #[tokio::test]
    async fn test_issue_token_uses_password_grant() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/aladdin/api/v1/issue-token")
                    .json_body(json!({
                        "client_id": "client-1",
                        "client_secret": "client-secret",
                        "username": "ops@example.com",
                        "password": "hunter22",
                        "grant_type": "password"
                    }));
                then.status(200).json_body(json!({
                    "token_type": "Bearer",
                    "expires_in": 432000,
                    "access_token": "fresh-token",
                    "refresh_token": "r"
                }));
            })
            .await;

        let response = client(config(&server.base_url())).issue_token().await.unwrap();

        mock.assert_async().await;
        assert_eq!(access_token_from(&response), Some("fresh-token"));
    }

    #[tokio::test]
    async fn test_zone_lookup_sends_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/aladdin/api/v1/cities/1/zone-list")
                    .header("Authorization", "Bearer tok-abc");
                then.status(200)
                    .json_body(json!({"data": {"data": [{"zone_id": 52, "zone_name": "Mirpur"}]}}));
            })
            .await;

        let zones = client(config(&server.base_url())).zones(1).await.unwrap();

        mock.assert_async().await;
        assert_eq!(zones["data"]["data"][0]["zone_id"], 52);
    }

    #[tokio::test]
    async fn test_create_order_defaults_store_and_extracts_consignment() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/aladdin/api/v1/orders")
                    .json_body_partial(
                        r#"{"store_id": 1201, "merchant_order_id": "INV-2002", "recipient_city": 1, "recipient_zone": 52, "delivery_type": 48, "item_type": 2}"#,
                    );
                then.status(200).json_body(json!({
                    "message": "Order Created Successfully",
                    "type": "success",
                    "code": 200,
                    "data": {"consignment_id": "DL121224VS8TTJ", "order_status": "Pending"}
                }));
            })
            .await;

        let result = client(config(&server.base_url()))
            .create_order(&order())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.tracking_code.as_deref(), Some("DL121224VS8TTJ"));
    }

    #[tokio::test]
    async fn test_create_order_requires_city_and_zone() {
        let server = MockServer::start_async().await;
        let mut req = order();
        req.destination.zone_id = None;

        let err = client(config(&server.base_url()))
            .create_order(&req)
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_token_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path_contains("/");
                then.status(200);
            })
            .await;

        let mut cfg = config(&server.base_url());
        cfg.access_token = None;
        let client = client(cfg);

        assert!(client.cities().await.unwrap_err().is_not_configured());
        assert!(client.create_order(&order()).await.unwrap_err().is_not_configured());

        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_missing_store_id_is_not_configured() {
        let server = MockServer::start_async().await;
        let mut cfg = config(&server.base_url());
        cfg.store_id = None;

        let err = client(cfg).create_order(&order()).await.unwrap_err();
        assert!(matches!(
            err,
            CourierError::NotConfigured {
                key: "pathao_store_id",
                ..
            }
        ));
    }

    #[test]
    fn test_default_weight_is_half_kilo() {
        assert_eq!(DEFAULT_WEIGHT_KG.to_string(), "0.5");
    }

    #[tokio::test]
    async fn test_create_order_without_token_reports_configuration_first() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path_contains("/");
                then.status(200).json_body(json!({}));
            })
            .await;
        let config = PathaoConfig {
            access_token: None,
            ..config(&server.base_url())
        };
        let request = CourierOrderRequest {
            destination: Destination::default(),
            ..order()
        };

        let err = client(config).create_order(&request).await.unwrap_err();

        assert!(err.is_not_configured(), "{err}");
        mock.assert_hits_async(0).await;
    }
}
