//! Paperfly legacy courier API client.
//!
//! No auth headers: the merchant username and password ride inside every
//! JSON body. Destinations are addressed by thana and district name.

use parcelhub_core::CourierProvider;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::http::{endpoint, send_json};
use super::settings::PaperflyConfig;
use super::{CourierError, CourierOrderRequest, CourierOrderResult};

const PROVIDER: CourierProvider = CourierProvider::Paperfly;

/// Paperfly API client.
#[derive(Debug, Clone)]
pub struct PaperflyClient {
    http: reqwest::Client,
    config: PaperflyConfig,
}

/// A request body with the merchant login merged in.
#[derive(Serialize)]
struct WithLogin<'a, T: Serialize> {
    username: &'a str,
    password: &'a str,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderPayload<'a> {
    mer_order_ref: &'a str,
    custname: &'a str,
    custaddress: &'a str,
    customer_thana: &'a str,
    customer_district: &'a str,
    cust_phone: &'a str,
    #[serde(rename = "productBrief")]
    product_brief: &'a str,
    #[serde(with = "rust_decimal::serde::str")]
    package_price: Decimal,
    #[serde(rename = "max_weight", with = "rust_decimal::serde::str")]
    max_weight: Decimal,
    delivery_option: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct TrackPayload<'a> {
    #[serde(rename = "ReferenceNumber")]
    reference_number: &'a str,
}

#[derive(Debug, Serialize)]
struct CancelPayload<'a> {
    order_id: &'a str,
}

impl PaperflyClient {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: PaperflyConfig) -> Self {
        Self { http, config }
    }

    async fn post<T: Serialize + Send>(&self, path: &str, body: T) -> Result<Value, CourierError> {
        let (username, password) = self.config.require_login()?;
        let payload = WithLogin {
            username,
            password: password.expose_secret(),
            body,
        };
        let request = self
            .http
            .post(endpoint(&self.config.base_url, path))
            .json(&payload);
        send_json(PROVIDER, request).await
    }

    /// Place an order. Tracking code comes from `success.tracking_number`.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Validation` without a destination thana and
    /// district, `CourierError::NotConfigured` without a login.
    #[instrument(skip(self, request), fields(invoice = %request.invoice))]
    pub async fn create_order(
        &self,
        request: &CourierOrderRequest,
    ) -> Result<CourierOrderResult, CourierError> {
        self.config.require_login()?;

        let dest = &request.destination;
        let (Some(thana), Some(district)) = (dest.thana.as_deref(), dest.district.as_deref())
        else {
            return Err(CourierError::Validation(
                "Paperfly orders require destination thana and district".to_string(),
            ));
        };

        let payload = OrderPayload {
            mer_order_ref: &request.invoice,
            custname: &request.recipient_name,
            custaddress: &request.recipient_address,
            customer_thana: thana,
            customer_district: district,
            cust_phone: &request.recipient_phone,
            product_brief: request.item_description.as_deref().unwrap_or("Parcel"),
            package_price: request.cod_amount,
            max_weight: request.weight.unwrap_or(Decimal::ONE),
            delivery_option: "regular",
            comment: request.note.as_deref(),
        };

        let raw = self.post("/OrderPlacement", payload).await?;
        Ok(CourierOrderResult::from_response(
            PROVIDER,
            raw,
            "/success/tracking_number",
        ))
    }

    /// Order history by merchant reference.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without a login.
    #[instrument(skip(self))]
    pub async fn track_order(&self, reference: &str) -> Result<Value, CourierError> {
        self.post(
            "/API-Order-Tracking",
            TrackPayload {
                reference_number: reference,
            },
        )
        .await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without a login.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: &str) -> Result<Value, CourierError> {
        self.post("/api/v1/cancel-order/", CancelPayload { order_id })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::couriers::Destination;
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;
    use std::time::Duration;

    fn client(base_url: &str, configured: bool) -> PaperflyClient {
        let config = PaperflyConfig {
            base_url: base_url.to_string(),
            username: configured.then(|| "m-1001".to_string()),
            password: configured.then(|| SecretString::from("pf-pass".to_string())),
        };
        let http = crate::couriers::http::build_client(Duration::from_secs(5)).unwrap();
        PaperflyClient::new(http, config)
    }

    #[tokio::test]
    async fn test_create_order_embeds_login_in_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/OrderPlacement").json_body_partial(
                    r#"{"username": "m-1001", "password": "pf-pass", "merOrderRef": "INV-4", "customerThana": "Gulshan", "customerDistrict": "Dhaka", "packagePrice": "1500"}"#,
                );
                then.status(200).json_body(json!({
                    "response_code": 200,
                    "success": {"message": "Order placed", "tracking_number": "PF-998877"}
                }));
            })
            .await;

        let request = CourierOrderRequest {
            invoice: "INV-4".to_string(),
            recipient_name: "Tania".to_string(),
            recipient_phone: "01611111111".to_string(),
            recipient_address: "Gulshan 2".to_string(),
            cod_amount: Decimal::from(1500),
            destination: Destination {
                thana: Some("Gulshan".to_string()),
                district: Some("Dhaka".to_string()),
                ..Destination::default()
            },
            ..CourierOrderRequest::default()
        };

        let result = client(&server.base_url(), true)
            .create_order(&request)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.tracking_code.as_deref(), Some("PF-998877"));
    }

    #[tokio::test]
    async fn test_track_and_cancel_bodies() {
        let server = MockServer::start_async().await;
        let track = server
            .mock_async(|when, then| {
                when.method(POST).path("/API-Order-Tracking").json_body(json!({
                    "username": "m-1001",
                    "password": "pf-pass",
                    "ReferenceNumber": "INV-4"
                }));
                then.status(200).json_body(json!({"success": {"trackingStatus": []}}));
            })
            .await;
        let cancel = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/cancel-order/").json_body(json!({
                    "username": "m-1001",
                    "password": "pf-pass",
                    "order_id": "INV-4"
                }));
                then.status(200).json_body(json!({"success": {"message": "cancelled"}}));
            })
            .await;

        let client = client(&server.base_url(), true);
        client.track_order("INV-4").await.unwrap();
        client.cancel_order("INV-4").await.unwrap();

        track.assert_async().await;
        cancel.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_login_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path_contains("/");
                then.status(200);
            })
            .await;

        let err = client(&server.base_url(), false)
            .track_order("INV-4")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourierError::NotConfigured {
                key: "paperfly_username",
                ..
            }
        ));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_create_order_without_login_reports_configuration_first() {
        let request = CourierOrderRequest {
            invoice: "INV-4".to_string(),
            recipient_name: "Tania".to_string(),
            recipient_phone: "01611111111".to_string(),
            recipient_address: "Gulshan 2".to_string(),
            ..CourierOrderRequest::default()
        };

        let err = client("http://127.0.0.1:9", false)
            .create_order(&request)
            .await
            .unwrap_err();

        assert!(err.is_not_configured(), "{err}");
    }
}
