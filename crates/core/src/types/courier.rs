//! Courier provider identifiers.

use serde::{Deserialize, Serialize};

/// Returned when a provider name does not match any integrated courier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown courier provider: {0}")]
pub struct UnknownProvider(pub String);

/// One of the integrated courier / logistics services.
///
/// Each provider has its own wire contract and authentication scheme; this
/// enum only names them so routes and the balance dispatcher can select an
/// adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourierProvider {
    /// Invoice-based domestic courier aggregator (API key + secret headers).
    Steadfast,
    /// Parcel network with city/zone/area hierarchy (OAuth access token).
    Pathao,
    /// Parcel and pickup-store API (bearer token header).
    Redx,
    /// Legacy courier with credentials in the request body.
    Paperfly,
    /// REST courier with key/secret/user-id headers.
    #[serde(rename = "ecourier")]
    ECourier,
}

impl CourierProvider {
    /// All integrated providers.
    pub const ALL: [Self; 5] = [
        Self::Steadfast,
        Self::Pathao,
        Self::Redx,
        Self::Paperfly,
        Self::ECourier,
    ];

    /// Machine name, also the settings key prefix (`steadfast_api_key`, ...).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Steadfast => "steadfast",
            Self::Pathao => "pathao",
            Self::Redx => "redx",
            Self::Paperfly => "paperfly",
            Self::ECourier => "ecourier",
        }
    }

    /// Human-facing name for messages.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Steadfast => "Steadfast",
            Self::Pathao => "Pathao",
            Self::Redx => "RedX",
            Self::Paperfly => "Paperfly",
            Self::ECourier => "eCourier",
        }
    }
}

impl std::fmt::Display for CourierProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CourierProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "steadfast" => Ok(Self::Steadfast),
            "pathao" => Ok(Self::Pathao),
            "redx" => Ok(Self::Redx),
            "paperfly" => Ok(Self::Paperfly),
            "ecourier" | "e-courier" | "e_courier" => Ok(Self::ECourier),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}
