//! Steadfast (Packzy) courier API client.
//!
//! Invoice-based order placement with a free-text address. Authenticates
//! every request with the `Api-Key` / `Secret-Key` header pair. Also the
//! only provider with a balance endpoint and a delivery-reputation
//! (`fraud_check`) endpoint.

use parcelhub_core::CourierProvider;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::http::{endpoint, send_json};
use super::settings::SteadfastConfig;
use super::{CourierError, CourierOrderRequest, CourierOrderResult};

const PROVIDER: CourierProvider = CourierProvider::Steadfast;

/// Upper bound of the bulk endpoint.
pub const MAX_BULK_ORDERS: usize = 500;

/// Steadfast API client.
#[derive(Debug, Clone)]
pub struct SteadfastClient {
    http: reqwest::Client,
    config: SteadfastConfig,
}

#[derive(Debug, Serialize)]
struct OrderPayload<'a> {
    invoice: &'a str,
    recipient_name: &'a str,
    recipient_phone: &'a str,
    recipient_address: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    cod_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

impl<'a> From<&'a CourierOrderRequest> for OrderPayload<'a> {
    fn from(req: &'a CourierOrderRequest) -> Self {
        Self {
            invoice: &req.invoice,
            recipient_name: &req.recipient_name,
            recipient_phone: &req.recipient_phone,
            recipient_address: &req.recipient_address,
            cod_amount: req.cod_amount,
            note: req.note.as_deref(),
        }
    }
}

/// Which identifier a status lookup uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLookup {
    /// Steadfast consignment ID.
    Consignment,
    /// Merchant invoice.
    Invoice,
    /// Steadfast tracking code.
    TrackingCode,
}

impl std::str::FromStr for StatusLookup {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cid" | "consignment" => Ok(Self::Consignment),
            "invoice" => Ok(Self::Invoice),
            "tracking" | "tracking_code" => Ok(Self::TrackingCode),
            other => Err(CourierError::Validation(format!(
                "unknown status lookup: {other}"
            ))),
        }
    }
}

impl SteadfastClient {
    #[must_use]
    pub const fn new(http: reqwest::Client, config: SteadfastConfig) -> Self {
        Self { http, config }
    }

    /// Whether both keys are present.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn authorized(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, CourierError> {
        let (api_key, secret_key) = self.config.require_keys()?;
        Ok(self
            .http
            .request(method, endpoint(&self.config.base_url, path))
            .header("Api-Key", api_key.expose_secret())
            .header("Secret-Key", secret_key.expose_secret()))
    }

    /// Place a single order.
    ///
    /// The tracking code comes from `consignment.tracking_code`.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` if the key pair is missing, or
    /// a transport/upstream error from the call.
    #[instrument(skip(self, request), fields(invoice = %request.invoice))]
    pub async fn create_order(
        &self,
        request: &CourierOrderRequest,
    ) -> Result<CourierOrderResult, CourierError> {
        let builder = self.authorized(reqwest::Method::POST, "/create_order")?;
        let raw = send_json(PROVIDER, builder.json(&OrderPayload::from(request))).await?;
        Ok(CourierOrderResult::from_response(
            PROVIDER,
            raw,
            "/consignment/tracking_code",
        ))
    }

    /// Place up to [`MAX_BULK_ORDERS`] orders in one call.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Validation` for an empty or oversized batch.
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn bulk_create_orders(
        &self,
        requests: &[CourierOrderRequest],
    ) -> Result<Value, CourierError> {
        if requests.is_empty() {
            return Err(CourierError::Validation("no orders supplied".to_string()));
        }
        if requests.len() > MAX_BULK_ORDERS {
            return Err(CourierError::Validation(format!(
                "at most {MAX_BULK_ORDERS} orders per bulk request"
            )));
        }

        let builder = self.authorized(reqwest::Method::POST, "/create_order/bulk-order")?;
        let data: Vec<OrderPayload<'_>> = requests.iter().map(OrderPayload::from).collect();
        send_json(PROVIDER, builder.json(&serde_json::json!({ "data": data }))).await
    }

    /// Delivery status by identifier.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` if the key pair is missing, or
    /// a transport/upstream error from the call.
    #[instrument(skip(self))]
    pub async fn status(&self, lookup: StatusLookup, id: &str) -> Result<Value, CourierError> {
        let prefix = match lookup {
            StatusLookup::Consignment => "status_by_cid",
            StatusLookup::Invoice => "status_by_invoice",
            StatusLookup::TrackingCode => "status_by_trackingcode",
        };
        let path = format!("/{prefix}/{}", urlencoding::encode(id));
        let builder = self.authorized(reqwest::Method::GET, &path)?;
        send_json(PROVIDER, builder).await
    }

    /// # Errors
    ///
    /// See [`Self::status`].
    pub async fn status_by_consignment(&self, consignment_id: &str) -> Result<Value, CourierError> {
        self.status(StatusLookup::Consignment, consignment_id).await
    }

    /// # Errors
    ///
    /// See [`Self::status`].
    pub async fn status_by_invoice(&self, invoice: &str) -> Result<Value, CourierError> {
        self.status(StatusLookup::Invoice, invoice).await
    }

    /// # Errors
    ///
    /// See [`Self::status`].
    pub async fn status_by_tracking_code(&self, tracking_code: &str) -> Result<Value, CourierError> {
        self.status(StatusLookup::TrackingCode, tracking_code).await
    }

    /// Current merchant balance.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` if the key pair is missing, or
    /// a transport/upstream error from the call.
    #[instrument(skip(self))]
    pub async fn balance(&self) -> Result<Value, CourierError> {
        let builder = self.authorized(reqwest::Method::GET, "/get_balance")?;
        send_json(PROVIDER, builder).await
    }

    /// Delivery reputation of a phone number across Steadfast's network.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Parse` if the response carries no parcel counts.
    #[instrument(skip(self))]
    pub async fn fraud_check(&self, phone: &str) -> Result<DeliveryReputation, CourierError> {
        let path = format!("/fraud_check/{}", urlencoding::encode(phone));
        let builder = self.authorized(reqwest::Method::GET, &path)?;
        let raw = send_json(PROVIDER, builder).await?;
        DeliveryReputation::from_response(&raw).map_err(|message| CourierError::Parse {
            provider: PROVIDER,
            message,
        })
    }
}

// =============================================================================
// Delivery reputation
// =============================================================================

/// A phone number's delivery history as reported by Steadfast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryReputation {
    pub total_parcels: u64,
    pub total_delivered: u64,
    pub total_cancelled: u64,
    /// Number of fraud reports filed against the number.
    pub fraud_report_count: u64,
    /// Report details when the provider lists them.
    pub fraud_reports: Vec<Value>,
    /// Delivered / parcels × 100, unrounded. `100.0` when there is no history.
    pub success_ratio: f64,
}

impl DeliveryReputation {
    /// Build from raw counts.
    #[must_use]
    pub fn new(total_parcels: u64, total_delivered: u64, total_cancelled: u64) -> Self {
        Self {
            total_parcels,
            total_delivered,
            total_cancelled,
            fraud_report_count: 0,
            fraud_reports: Vec::new(),
            success_ratio: success_ratio(total_delivered, total_parcels),
        }
    }

    #[must_use]
    pub const fn has_fraud_reports(&self) -> bool {
        self.fraud_report_count > 0
    }

    /// Parse the `fraud_check` body.
    ///
    /// Counts may arrive as numbers or numeric strings, at the top level or
    /// under `data`. Fraud reports may be a list or a count.
    ///
    /// # Errors
    ///
    /// Returns a message if `total_parcels` is absent.
    pub fn from_response(raw: &Value) -> Result<Self, String> {
        let body = raw.get("data").filter(|d| d.is_object()).unwrap_or(raw);

        let total_parcels = count(body, "total_parcels")
            .ok_or_else(|| "missing total_parcels in fraud_check response".to_string())?;
        let total_delivered = count(body, "total_delivered").unwrap_or(0);
        let total_cancelled = count(body, "total_cancelled").unwrap_or(0);

        let mut reputation = Self::new(total_parcels, total_delivered, total_cancelled);

        let reports = body
            .get("total_fraud_reports")
            .or_else(|| body.get("fraud_reports"));
        match reports {
            Some(Value::Array(items)) => {
                reputation.fraud_report_count = items.len() as u64;
                reputation.fraud_reports.clone_from(items);
            }
            Some(other) => reputation.fraud_report_count = as_count(other).unwrap_or(0),
            None => {}
        }

        Ok(reputation)
    }
}

fn count(body: &Value, key: &str) -> Option<u64> {
    body.get(key).and_then(as_count)
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn success_ratio(delivered: u64, parcels: u64) -> f64 {
    if parcels == 0 {
        return 100.0;
    }
    delivered as f64 / parcels as f64 * 100.0
}
