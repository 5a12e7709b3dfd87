//! Entry point from routes and services into the courier adapters.
//!
//! [`CourierGateway`] resolves the current `courier` settings on every call
//! and hands back a typed client for one provider. The generic order layer
//! and the balance dispatch are the only places that select a provider by
//! name.

use parcelhub_core::CourierProvider;
use serde_json::{Value, json};
use tracing::instrument;

use super::ecourier::ECourierClient;
use super::paperfly::PaperflyClient;
use super::pathao::PathaoClient;
use super::redx::RedxClient;
use super::settings::SettingsResolver;
use super::steadfast::SteadfastClient;
use super::{CourierError, CourierOrderRequest, CourierOrderResult};

/// Shared HTTP client plus settings resolver.
#[derive(Debug, Clone)]
pub struct CourierGateway {
    http: reqwest::Client,
    resolver: SettingsResolver,
}

impl CourierGateway {
    #[must_use]
    pub const fn new(http: reqwest::Client, resolver: SettingsResolver) -> Self {
        Self { http, resolver }
    }

    #[must_use]
    pub const fn resolver(&self) -> &SettingsResolver {
        &self.resolver
    }

    /// # Errors
    ///
    /// Returns `CourierError::Settings` if settings cannot be read.
    pub async fn steadfast(&self) -> Result<SteadfastClient, CourierError> {
        let settings = self.resolver.courier().await?;
        Ok(SteadfastClient::new(self.http.clone(), settings.steadfast()))
    }

    /// # Errors
    ///
    /// Returns `CourierError::Settings` if settings cannot be read.
    pub async fn pathao(&self) -> Result<PathaoClient, CourierError> {
        let settings = self.resolver.courier().await?;
        Ok(PathaoClient::new(self.http.clone(), settings.pathao()))
    }

    /// # Errors
    ///
    /// Returns `CourierError::Settings` if settings cannot be read.
    pub async fn redx(&self) -> Result<RedxClient, CourierError> {
        let settings = self.resolver.courier().await?;
        Ok(RedxClient::new(self.http.clone(), settings.redx()))
    }

    /// # Errors
    ///
    /// Returns `CourierError::Settings` if settings cannot be read.
    pub async fn paperfly(&self) -> Result<PaperflyClient, CourierError> {
        let settings = self.resolver.courier().await?;
        Ok(PaperflyClient::new(self.http.clone(), settings.paperfly()))
    }

    /// # Errors
    ///
    /// Returns `CourierError::Settings` if settings cannot be read.
    pub async fn ecourier(&self) -> Result<ECourierClient, CourierError> {
        let settings = self.resolver.courier().await?;
        Ok(ECourierClient::new(self.http.clone(), settings.ecourier()))
    }

    /// Place a shipment with `provider`.
    ///
    /// The returned tracking code is whatever the provider reported; it is
    /// not written to the order here.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::Validation` for an incomplete request, then
    /// any adapter error.
    #[instrument(skip(self, request), fields(provider = %provider, invoice = %request.invoice))]
    pub async fn create_shipment(
        &self,
        provider: CourierProvider,
        request: &CourierOrderRequest,
    ) -> Result<CourierOrderResult, CourierError> {
        request.validate().map_err(CourierError::Validation)?;

        let result = match provider {
            CourierProvider::Steadfast => self.steadfast().await?.create_order(request).await,
            CourierProvider::Pathao => self.pathao().await?.create_order(request).await,
            CourierProvider::Redx => self.redx().await?.create_parcel(request).await,
            CourierProvider::Paperfly => self.paperfly().await?.create_order(request).await,
            CourierProvider::ECourier => self.ecourier().await?.create_order(request).await,
        }?;

        tracing::info!(
            tracking_code = result.tracking_code.as_deref().unwrap_or("-"),
            "Shipment created"
        );

        Ok(result)
    }

    /// Balance for a provider named by free text.
    ///
    /// Matching is a case-insensitive substring test so labels like
    /// "Steadfast Courier" work. Only Steadfast has a balance endpoint; the
    /// others get [`balance_placeholder`].
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` for Steadfast without keys and
    /// `CourierError::Validation` for an unrecognized name.
    #[instrument(skip(self))]
    pub async fn check_balance(&self, provider_name: &str) -> Result<Value, CourierError> {
        let name = provider_name.trim().to_lowercase();

        if name.contains("steadfast") {
            return self.steadfast().await?.balance().await;
        }

        let unsupported = ["pathao", "redx", "paperfly", "courier"];
        if unsupported.iter().any(|p| name.contains(p)) {
            return Ok(balance_placeholder(provider_name.trim()));
        }

        Err(CourierError::Validation(format!(
            "unknown courier provider: {provider_name}"
        )))
    }
}

/// Zero-balance response for providers without a balance endpoint.
#[must_use]
pub fn balance_placeholder(provider_name: &str) -> Value {
    json!({
        "status": "success",
        "current_balance": 0,
        "message": format!("Balance check not supported for {provider_name}"),
    })
}
