//! RedX parcel API client.
//!
//! Auth is a bearer token sent in the non-standard `API-ACCESS-TOKEN`
//! header. Destinations are delivery areas looked up by post code or
//! district; parcels are addressed to an area ID plus its name.

use parcelhub_core::CourierProvider;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use super::http::{endpoint, endpoint_url, send_json};
use super::settings::RedxConfig;
use super::{CourierError, CourierOrderRequest, CourierOrderResult};

const PROVIDER: CourierProvider = CourierProvider::Redx;
const DEFAULT_WEIGHT_GRAMS: u32 = 500;

/// RedX API client.
#[derive(Debug, Clone)]
pub struct RedxClient {
    http: reqwest::Client,
    config: RedxConfig,
}

/// Area lookup filter. Both empty lists every area.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AreaFilter {
    pub post_code: Option<String>,
    pub district_name: Option<String>,
}

/// Pickup store registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPickupStore {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub area_id: i64,
}

#[derive(Debug, Serialize)]
struct ParcelPayload<'a> {
    customer_name: &'a str,
    customer_phone: &'a str,
    delivery_area: &'a str,
    delivery_area_id: i64,
    customer_address: &'a str,
    merchant_invoice_id: &'a str,
    #[serde(with = "rust_decimal::serde::str")]
    cash_collection_amount: Decimal,
    parcel_weight: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    instruction: Option<&'a str>,
    #[serde(with = "rust_decimal::serde::float")]
    value: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pickup_store_id: Option<i64>,
}

/// Kilograms to whole grams, falling back to the default parcel weight.
fn weight_grams(weight_kg: Option<Decimal>) -> u32 {
    weight_kg
        .and_then(|kg| (kg * Decimal::from(1000)).round().to_u32())
        .filter(|g| *g > 0)
        .unwrap_or(DEFAULT_WEIGHT_GRAMS)
}

impl RedxClient {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: RedxConfig) -> Self {
        Self { http, config }
    }

    fn authorized(
        &self,
        method: reqwest::Method,
        url: impl reqwest::IntoUrl,
    ) -> Result<reqwest::RequestBuilder, CourierError> {
        let token = self.config.require_token()?;
        Ok(self.http.request(method, url).header(
            "API-ACCESS-TOKEN",
            format!("Bearer {}", token.expose_secret()),
        ))
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.config.base_url, path)
    }

    /// Delivery areas, optionally narrowed by post code or district.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn areas(&self, filter: &AreaFilter) -> Result<Value, CourierError> {
        self.config.require_token()?;
        let mut url = endpoint_url(PROVIDER, &self.config.base_url, "/areas")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(code) = filter.post_code.as_deref().filter(|s| !s.is_empty()) {
                query.append_pair("post_code", code);
            }
            if let Some(district) = filter.district_name.as_deref().filter(|s| !s.is_empty()) {
                query.append_pair("district_name", district);
            }
        }
        // Drop a dangling "?" when no filter applied.
        if url.query() == Some("") {
            url.set_query(None);
        }

        send_json(PROVIDER, self.authorized(reqwest::Method::GET, url)?).await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self, store), fields(name = %store.name))]
    pub async fn create_pickup_store(&self, store: &NewPickupStore) -> Result<Value, CourierError> {
        let builder = self.authorized(reqwest::Method::POST, self.url("/pickup/store"))?;
        send_json(PROVIDER, builder.json(store)).await
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn pickup_stores(&self) -> Result<Value, CourierError> {
        let builder = self.authorized(reqwest::Method::GET, self.url("/pickup/stores"))?;
        send_json(PROVIDER, builder).await
    }

    /// Create a parcel. Tracking code comes from `tracking_id`.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Validation` when the delivery area is missing.
    #[instrument(skip(self, request), fields(invoice = %request.invoice))]
    pub async fn create_parcel(
        &self,
        request: &CourierOrderRequest,
    ) -> Result<CourierOrderResult, CourierError> {
        self.config.require_token()?;

        let dest = &request.destination;
        let (Some(area_id), Some(area_name)) = (dest.area_id, dest.area_name.as_deref()) else {
            return Err(CourierError::Validation(
                "RedX parcels require destination area_id and area_name".to_string(),
            ));
        };

        let payload = ParcelPayload {
            customer_name: &request.recipient_name,
            customer_phone: &request.recipient_phone,
            delivery_area: area_name,
            delivery_area_id: area_id,
            customer_address: &request.recipient_address,
            merchant_invoice_id: &request.invoice,
            cash_collection_amount: request.cod_amount,
            parcel_weight: weight_grams(request.weight),
            instruction: request.note.as_deref(),
            value: request.declared_value(),
            pickup_store_id: dest.store_id,
        };

        let builder = self.authorized(reqwest::Method::POST, self.url("/parcel"))?;
        let raw = send_json(PROVIDER, builder.json(&payload)).await?;
        Ok(CourierOrderResult::from_response(PROVIDER, raw, "/tracking_id"))
    }

    /// Tracking events for a parcel.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn track_parcel(&self, tracking_id: &str) -> Result<Value, CourierError> {
        let url = self.url(&format!("/parcel/track/{}", urlencoding::encode(tracking_id)));
        send_json(PROVIDER, self.authorized(reqwest::Method::GET, url)?).await
    }

    /// Full parcel record.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn parcel_info(&self, tracking_id: &str) -> Result<Value, CourierError> {
        let url = self.url(&format!("/parcel/info/{}", urlencoding::encode(tracking_id)));
        send_json(PROVIDER, self.authorized(reqwest::Method::GET, url)?).await
    }

    /// Cancel a parcel that has not been picked up yet.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` without an access token.
    #[instrument(skip(self))]
    pub async fn cancel_parcel(&self, tracking_id: &str, reason: &str) -> Result<Value, CourierError> {
        let body = json!({
            "entity_type": "parcel-tracking-id",
            "entity_id": tracking_id,
            "update_details": {
                "property_name": "status",
                "new_value": "cancelled",
                "reason": reason,
            },
        });
        let builder = self.authorized(reqwest::Method::PATCH, self.url("/parcels"))?;
        send_json(PROVIDER, builder.json(&body)).await
    }
}
