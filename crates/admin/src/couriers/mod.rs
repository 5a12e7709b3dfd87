//! Courier provider integrations.
//!
//! Five couriers with five unrelated wire contracts. Each gets its own typed
//! client; the only shared pieces are settings resolution ([`settings`]) and
//! the call/error-wrap helper ([`http`]).
//!
//! | Provider | Auth | Geography |
//! |---|---|---|
//! | Steadfast | `Api-Key` + `Secret-Key` headers | free-text address |
//! | Pathao | OAuth bearer token | city → zone → area IDs |
//! | RedX | `API-ACCESS-TOKEN: Bearer` header | delivery area IDs |
//! | Paperfly | username/password in the JSON body | thana/district names |
//! | eCourier | `API-KEY` / `API-SECRET` / `USER-ID` headers | city → thana → postcode → area |
//!
//! # Failure semantics
//!
//! Adapters never retry. Missing credentials are reported as
//! [`CourierError::NotConfigured`] before any request is built. Transport
//! failures and non-2xx responses are logged once and returned with the
//! provider's own error body when one was sent.

pub mod ecourier;
pub mod gateway;
pub mod http;
pub mod paperfly;
pub mod pathao;
pub mod redx;
pub mod settings;
pub mod steadfast;
pub mod types;

pub use gateway::{CourierGateway, balance_placeholder};
pub use settings::{COURIER_GROUP, CourierSettings, SettingsResolver};
pub use types::{CourierOrderRequest, CourierOrderResult, Destination};

use parcelhub_core::CourierProvider;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur when calling a courier API.
#[derive(Debug, Error)]
pub enum CourierError {
    /// A required credential is absent from the `courier` settings group.
    #[error("{} is not configured: missing {key}", provider.display_name())]
    NotConfigured {
        provider: CourierProvider,
        key: &'static str,
    },

    /// The configured base URL cannot be parsed.
    #[error("{} base URL is invalid: {source}", provider.display_name())]
    InvalidBaseUrl {
        provider: CourierProvider,
        #[source]
        source: url::ParseError,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("{} request failed: {source}", provider.display_name())]
    Transport {
        provider: CourierProvider,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-2xx status.
    #[error("{} returned HTTP {status}", provider.display_name())]
    Upstream {
        provider: CourierProvider,
        status: u16,
        /// Provider error payload (JSON when parseable, raw text otherwise).
        body: serde_json::Value,
    },

    /// A 2xx response did not have the shape we rely on.
    #[error("unexpected response from {}: {message}", provider.display_name())]
    Parse {
        provider: CourierProvider,
        message: String,
    },

    /// Caller-supplied input is missing or invalid.
    #[error("{0}")]
    Validation(String),

    /// Settings could not be read.
    #[error("settings error: {0}")]
    Settings(#[from] RepositoryError),
}

impl CourierError {
    /// The provider's own error payload, when the failure came from upstream.
    #[must_use]
    pub const fn provider_payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Upstream { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether this is a missing-credential (configuration) error.
    #[must_use]
    pub const fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. } | Self::InvalidBaseUrl { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_display() {
        let err = CourierError::NotConfigured {
            provider: CourierProvider::Steadfast,
            key: "steadfast_api_key",
        };
        assert_eq!(
            err.to_string(),
            "Steadfast is not configured: missing steadfast_api_key"
        );
        assert!(err.is_not_configured());
    }

    #[test]
    fn test_upstream_exposes_payload() {
        let err = CourierError::Upstream {
            provider: CourierProvider::Redx,
            status: 422,
            body: serde_json::json!({"message": "invalid area"}),
        };
        assert_eq!(err.to_string(), "RedX returned HTTP 422");
        assert_eq!(
            err.provider_payload(),
            Some(&serde_json::json!({"message": "invalid area"}))
        );
        assert!(!err.is_not_configured());
    }
}
