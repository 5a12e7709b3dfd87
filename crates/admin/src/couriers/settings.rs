//! Courier settings resolution.
//!
//! Provider credentials live in the `settings` table (group `courier`) so an
//! administrator can rotate them without a deployment. [`SettingsResolver`]
//! folds the rows into a map on every resolve. An optional per-group cache
//! can be enabled with a TTL; writes made through [`SettingsResolver::upsert`]
//! invalidate the group so they are visible to the very next read.
//!
//! Adapters never look at the raw map. They receive one of the typed configs
//! below, which default the base URL to the provider's sandbox and expose
//! `require_*` checks that fail with [`CourierError::NotConfigured`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use parcelhub_core::CourierProvider;
use secrecy::SecretString;
use tracing::instrument;

use super::CourierError;
use crate::db::{RepositoryError, SettingsStore};

/// Settings group holding every carrier credential.
pub const COURIER_GROUP: &str = "courier";

pub const STEADFAST_DEFAULT_BASE_URL: &str = "https://portal.packzy.com/api/v1";
pub const PATHAO_DEFAULT_BASE_URL: &str = "https://courier-api-sandbox.pathao.com";
pub const REDX_DEFAULT_BASE_URL: &str = "https://sandbox.redx.com.bd/v1.0.0-beta";
pub const PAPERFLY_DEFAULT_BASE_URL: &str = "https://sandbox.paperflybd.com";
pub const ECOURIER_DEFAULT_BASE_URL: &str = "https://staging.ecourier.com.bd/api";

/// Every key the courier group knows about, in seeding order.
pub const COURIER_KEYS: &[&str] = &[
    "steadfast_api_key",
    "steadfast_secret_key",
    "steadfast_base_url",
    "pathao_client_id",
    "pathao_client_secret",
    "pathao_username",
    "pathao_password",
    "pathao_access_token",
    "pathao_store_id",
    "pathao_base_url",
    "redx_access_token",
    "redx_base_url",
    "paperfly_username",
    "paperfly_password",
    "paperfly_base_url",
    "ecourier_api_key",
    "ecourier_api_secret",
    "ecourier_user_id",
    "ecourier_base_url",
];

type GroupMap = Arc<HashMap<String, String>>;

/// Reads grouped key/value settings with a short-lived per-group cache.
#[derive(Clone)]
pub struct SettingsResolver {
    store: Arc<dyn SettingsStore>,
    /// `None` when the TTL is zero (every resolve hits the store).
    cache: Option<Cache<String, GroupMap>>,
}

impl fmt::Debug for SettingsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsResolver")
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl SettingsResolver {
    /// Create a resolver. A zero `ttl` disables caching.
    #[must_use]
    pub fn new(store: Arc<dyn SettingsStore>, ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(32)
                .time_to_live(ttl)
                .build()
        });

        Self { store, cache }
    }

    /// Resolve a settings group into a flat key/value map.
    ///
    /// Rows are folded in store order, so the last write for a key wins.
    /// Missing configuration is not an error; callers check for the keys
    /// they need.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn resolve(&self, group: &str) -> Result<HashMap<String, String>, RepositoryError> {
        if let Some(cache) = &self.cache
            && let Some(map) = cache.get(group).await
        {
            return Ok(map.as_ref().clone());
        }

        let rows = self.store.find_many(group).await?;
        let map: HashMap<String, String> = rows
            .into_iter()
            .map(|row| (row.key, row.value))
            .collect();

        tracing::debug!(group, keys = map.len(), "Resolved settings group");

        if let Some(cache) = &self.cache {
            cache.insert(group.to_string(), Arc::new(map.clone())).await;
        }

        Ok(map)
    }

    /// Write a setting and invalidate its group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store write fails.
    #[instrument(skip(self, value))]
    pub async fn upsert(&self, key: &str, value: &str, group: &str) -> Result<(), RepositoryError> {
        self.store.upsert(key, value, group).await?;
        self.invalidate(group).await;
        Ok(())
    }

    /// Drop any cached map for `group`.
    pub async fn invalidate(&self, group: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(group).await;
        }
    }

    /// Resolve the `courier` group into typed settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    pub async fn courier(&self) -> Result<CourierSettings, RepositoryError> {
        self.resolve(COURIER_GROUP).await.map(CourierSettings::new)
    }
}

// =============================================================================
// Typed views
// =============================================================================

/// The resolved `courier` settings group.
#[derive(Clone, Default)]
pub struct CourierSettings {
    values: HashMap<String, String>,
}

impl fmt::Debug for CourierSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("CourierSettings")
            .field("keys", &keys)
            .finish()
    }
}

impl CourierSettings {
    #[must_use]
    pub const fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// A configured, non-blank value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn owned(&self, key: &str) -> Option<String> {
        self.get(key).map(ToString::to_string)
    }

    fn secret(&self, key: &str) -> Option<SecretString> {
        self.get(key).map(|v| SecretString::from(v.to_string()))
    }

    fn base_url(&self, key: &str, default: &str) -> String {
        self.get(key)
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    #[must_use]
    pub fn steadfast(&self) -> SteadfastConfig {
        SteadfastConfig {
            base_url: self.base_url("steadfast_base_url", STEADFAST_DEFAULT_BASE_URL),
            api_key: self.secret("steadfast_api_key"),
            secret_key: self.secret("steadfast_secret_key"),
        }
    }

    #[must_use]
    pub fn pathao(&self) -> PathaoConfig {
        PathaoConfig {
            base_url: self.base_url("pathao_base_url", PATHAO_DEFAULT_BASE_URL),
            client_id: self.owned("pathao_client_id"),
            client_secret: self.secret("pathao_client_secret"),
            username: self.owned("pathao_username"),
            password: self.secret("pathao_password"),
            access_token: self.secret("pathao_access_token"),
            store_id: self.owned("pathao_store_id"),
        }
    }

    #[must_use]
    pub fn redx(&self) -> RedxConfig {
        RedxConfig {
            base_url: self.base_url("redx_base_url", REDX_DEFAULT_BASE_URL),
            access_token: self.secret("redx_access_token"),
        }
    }

    #[must_use]
    pub fn paperfly(&self) -> PaperflyConfig {
        PaperflyConfig {
            base_url: self.base_url("paperfly_base_url", PAPERFLY_DEFAULT_BASE_URL),
            username: self.owned("paperfly_username"),
            password: self.secret("paperfly_password"),
        }
    }

    #[must_use]
    pub fn ecourier(&self) -> ECourierConfig {
        ECourierConfig {
            base_url: self.base_url("ecourier_base_url", ECOURIER_DEFAULT_BASE_URL),
            api_key: self.secret("ecourier_api_key"),
            api_secret: self.secret("ecourier_api_secret"),
            user_id: self.owned("ecourier_user_id"),
        }
    }
}

fn require<'a, T>(
    provider: CourierProvider,
    key: &'static str,
    value: Option<&'a T>,
) -> Result<&'a T, CourierError> {
    value.ok_or(CourierError::NotConfigured { provider, key })
}

/// Steadfast credentials.
#[derive(Debug, Clone)]
pub struct SteadfastConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub secret_key: Option<SecretString>,
}

impl SteadfastConfig {
    /// API key and secret key, both required for every call.
    ///
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` naming the first missing key.
    pub fn require_keys(&self) -> Result<(&SecretString, &SecretString), CourierError> {
        let provider = CourierProvider::Steadfast;
        Ok((
            require(provider, "steadfast_api_key", self.api_key.as_ref())?,
            require(provider, "steadfast_secret_key", self.secret_key.as_ref())?,
        ))
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.secret_key.is_some()
    }
}

/// Pathao credentials.
///
/// The access token is issued by [`super::pathao::PathaoClient::issue_token`]
/// from the client/user credentials and stored back into settings.
#[derive(Debug, Clone)]
pub struct PathaoConfig {
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub access_token: Option<SecretString>,
    pub store_id: Option<String>,
}

/// Password-grant credentials for the Pathao token endpoint.
pub struct PathaoGrant<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a SecretString,
    pub username: &'a str,
    pub password: &'a SecretString,
}

impl PathaoConfig {
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` if no access token is stored.
    pub fn require_token(&self) -> Result<&SecretString, CourierError> {
        require(
            CourierProvider::Pathao,
            "pathao_access_token",
            self.access_token.as_ref(),
        )
    }

    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` naming the first missing key.
    pub fn require_grant(&self) -> Result<PathaoGrant<'_>, CourierError> {
        let provider = CourierProvider::Pathao;
        Ok(PathaoGrant {
            client_id: require(provider, "pathao_client_id", self.client_id.as_ref())?,
            client_secret: require(provider, "pathao_client_secret", self.client_secret.as_ref())?,
            username: require(provider, "pathao_username", self.username.as_ref())?,
            password: require(provider, "pathao_password", self.password.as_ref())?,
        })
    }
}

/// RedX credentials.
#[derive(Debug, Clone)]
pub struct RedxConfig {
    pub base_url: String,
    pub access_token: Option<SecretString>,
}

impl RedxConfig {
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` if no access token is stored.
    pub fn require_token(&self) -> Result<&SecretString, CourierError> {
        require(
            CourierProvider::Redx,
            "redx_access_token",
            self.access_token.as_ref(),
        )
    }
}

/// Paperfly credentials (sent in every request body).
#[derive(Debug, Clone)]
pub struct PaperflyConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl PaperflyConfig {
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` naming the first missing key.
    pub fn require_login(&self) -> Result<(&str, &SecretString), CourierError> {
        let provider = CourierProvider::Paperfly;
        Ok((
            require(provider, "paperfly_username", self.username.as_ref())?,
            require(provider, "paperfly_password", self.password.as_ref())?,
        ))
    }
}

/// eCourier credentials.
#[derive(Debug, Clone)]
pub struct ECourierConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub api_secret: Option<SecretString>,
    pub user_id: Option<String>,
}

/// The eCourier header triple.
pub struct ECourierKeys<'a> {
    pub api_key: &'a SecretString,
    pub api_secret: &'a SecretString,
    pub user_id: &'a str,
}

impl ECourierConfig {
    /// # Errors
    ///
    /// Returns `CourierError::NotConfigured` naming the first missing key.
    pub fn require_keys(&self) -> Result<ECourierKeys<'_>, CourierError> {
        let provider = CourierProvider::ECourier;
        Ok(ECourierKeys {
            api_key: require(provider, "ecourier_api_key", self.api_key.as_ref())?,
            api_secret: require(provider, "ecourier_api_secret", self.api_secret.as_ref())?,
            user_id: require(provider, "ecourier_user_id", self.user_id.as_ref())?,
        })
    }
}
