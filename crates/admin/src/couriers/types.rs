//! Normalized shipment request/result shared by the generic order layer.

use parcelhub_core::CourierProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider-neutral shipment request.
///
/// Each adapter maps the subset it understands. Geographic IDs must already
/// be resolved through the provider's own lookup endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourierOrderRequest {
    /// Merchant reference (order number / invoice).
    pub invoice: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    /// Cash to collect on delivery.
    #[serde(default)]
    pub cod_amount: Decimal,
    /// Parcel weight in kilograms.
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub item_description: Option<String>,
    #[serde(default)]
    pub item_quantity: Option<u32>,
    /// Value declared to the courier (defaults to the COD amount).
    #[serde(default)]
    pub product_value: Option<Decimal>,
    #[serde(default)]
    pub destination: Destination,
}

impl CourierOrderRequest {
    /// Check the fields every provider needs.
    ///
    /// # Errors
    ///
    /// Returns the name of the first blank required field.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("invoice", &self.invoice),
            ("recipient_name", &self.recipient_name),
            ("recipient_phone", &self.recipient_phone),
            ("recipient_address", &self.recipient_address),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{field} is required"));
            }
        }
        if self.cod_amount.is_sign_negative() {
            return Err("cod_amount must not be negative".to_string());
        }
        Ok(())
    }

    pub(crate) fn quantity(&self) -> u32 {
        self.item_quantity.unwrap_or(1).max(1)
    }

    pub(crate) fn declared_value(&self) -> Decimal {
        self.product_value.unwrap_or(self.cod_amount)
    }
}

/// Provider-specific destination identifiers.
///
/// Pathao uses city/zone/area IDs, RedX a delivery area, Paperfly and
/// eCourier names from their own lookup lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Destination {
    pub city_id: Option<i64>,
    pub zone_id: Option<i64>,
    pub area_id: Option<i64>,
    pub area_name: Option<String>,
    pub city: Option<String>,
    pub thana: Option<String>,
    pub district: Option<String>,
    pub postcode: Option<String>,
    /// Provider store / pickup location (Pathao `store_id`, RedX `pickup_store_id`).
    pub store_id: Option<i64>,
    /// eCourier package code (see `/packages`).
    pub package_code: Option<String>,
}

/// Result of a successful upstream order creation.
#[derive(Debug, Clone, Serialize)]
pub struct CourierOrderResult {
    pub provider: CourierProvider,
    /// Provider-assigned tracking identifier, when the response carried one.
    pub tracking_code: Option<String>,
    /// Upstream body, untouched.
    pub raw: Value,
}

impl CourierOrderResult {
    /// Build a result, pulling the tracking code from `pointer`.
    pub(crate) fn from_response(provider: CourierProvider, raw: Value, pointer: &str) -> Self {
        let tracking_code = match raw.pointer(pointer) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Self {
            provider,
            tracking_code,
            raw,
        }
    }
}
