//! eCourier REST API client.
//!
//! Every endpoint is a `POST` authenticated with the `API-KEY`,
//! `API-SECRET` and `USER-ID` headers. Destinations use eCourier's own
//! city → thana → postcode → area names.

use parcelhub_core::CourierProvider;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::http::{endpoint, send_json};
use super::settings::ECourierConfig;
use super::{CourierError, CourierOrderRequest, CourierOrderResult};

const PROVIDER: CourierProvider = CourierProvider::ECourier;

/// eCourier API client.
#[derive(Debug, Clone)]
pub struct ECourierClient {
    http: reqwest::Client,
    config: ECourierConfig,
}

#[derive(Debug, Serialize)]
struct OrderPayload<'a> {
    recipient_name: &'a str,
    recipient_mobile: &'a str,
    recipient_city: &'a str,
    recipient_area: &'a str,
    recipient_thana: &'a str,
    recipient_zip: &'a str,
    recipient_address: &'a str,
    package_code: &'a str,
    product_id: &'a str,
    #[serde(with = "rust_decimal::serde::str")]
    product_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    actual_product_price: Decimal,
    payment_method: &'static str,
    parcel_type: &'static str,
    number_of_item: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    comments: Option<&'a str>,
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, CourierError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CourierError::Validation(format!("eCourier orders require destination {name}")))
}

impl ECourierClient {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: ECourierConfig) -> Self {
        Self { http, config }
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<Value, CourierError> {
        let keys = self.config.require_keys()?;
        let request = self
            .http
            .post(endpoint(&self.config.base_url, path))
            .header("API-KEY", keys.api_key.expose_secret())
            .header("API-SECRET", keys.api_secret.expose_secret())
            .header("USER-ID", keys.user_id)
            .json(body);
        send_json(PROVIDER, request).await
    }

    /// Place an order. Tracking code comes from `ID`.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Validation` when the destination city, thana,
    /// area, postcode or package code is missing.
    #[instrument(skip(self, request), fields(invoice = %request.invoice))]
    pub async fn create_order(
        &self,
        request: &CourierOrderRequest,
    ) -> Result<CourierOrderResult, CourierError> {
        self.config.require_keys()?;

        let dest = &request.destination;
        let payload = OrderPayload {
            recipient_name: &request.recipient_name,
            recipient_mobile: &request.recipient_phone,
            recipient_city: required(dest.city.as_deref(), "city")?,
            recipient_area: required(dest.area_name.as_deref(), "area_name")?,
            recipient_thana: required(dest.thana.as_deref(), "thana")?,
            recipient_zip: required(dest.postcode.as_deref(), "postcode")?,
            recipient_address: &request.recipient_address,
            package_code: required(dest.package_code.as_deref(), "package_code")?,
            product_id: &request.invoice,
            product_price: request.cod_amount,
            actual_product_price: request.declared_value(),
            payment_method: "COD",
            parcel_type: "BOX",
            number_of_item: request.quantity(),
            comments: request.note.as_deref(),
        };

        let raw = self.post("/order-place", &payload).await?;
        Ok(CourierOrderResult::from_response(PROVIDER, raw, "/ID"))
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without the header triple.
    #[instrument(skip(self))]
    pub async fn track(&self, tracking: &str) -> Result<Value, CourierError> {
        self.post("/track", &json!({ "ecr": tracking })).await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without the header triple.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, tracking: &str, comment: &str) -> Result<Value, CourierError> {
        self.post(
            "/cancel-order",
            &json!({ "tracking": tracking, "comment": comment }),
        )
        .await
    }

    // =========================================================================
    // Geography
    // =========================================================================

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without the header triple.
    #[instrument(skip(self))]
    pub async fn cities(&self) -> Result<Value, CourierError> {
        self.post("/city-list", &json!({})).await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without the header triple.
    #[instrument(skip(self))]
    pub async fn thanas(&self, city: &str) -> Result<Value, CourierError> {
        self.post("/thana-list", &json!({ "city": city })).await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without the header triple.
    #[instrument(skip(self))]
    pub async fn postcodes(&self, city: &str, thana: &str) -> Result<Value, CourierError> {
        self.post("/postcode-list", &json!({ "city": city, "thana": thana }))
            .await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without the header triple.
    #[instrument(skip(self))]
    pub async fn areas(&self, postcode: &str) -> Result<Value, CourierError> {
        self.post("/area-list", &json!({ "postcode": postcode })).await
    }

    /// Delivery packages available to this merchant.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without the header triple.
    #[instrument(skip(self))]
    pub async fn packages(&self) -> Result<Value, CourierError> {
        self.post("/packages", &json!({})).await
    }
}
