//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::config::{AdminConfig, CourierRuntimeConfig};
use crate::couriers::{CourierGateway, SettingsResolver, http::build_client};
use crate::db::{
    BlacklistStore, OrderStore, PgBlacklistStore, PgOrderStore, PgSettingsStore, PgUserStore,
    SettingsStore, UserStore,
};
use crate::services::{CourierAssignmentService, FraudEvaluator};

/// Storage backends the services are built on.
#[derive(Clone)]
pub struct Stores {
    pub settings: Arc<dyn SettingsStore>,
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserStore>,
    pub blacklist: Arc<dyn BlacklistStore>,
}

impl Stores {
    /// `PostgreSQL`-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            settings: Arc::new(PgSettingsStore::new(pool.clone())),
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool.clone())),
            blacklist: Arc::new(PgBlacklistStore::new(pool.clone())),
        }
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    api_token_digest: [u8; 32],
    pool: Option<PgPool>,
    couriers: CourierGateway,
    fraud: FraudEvaluator,
    assignment: CourierAssignmentService,
    blacklist: Arc<dyn BlacklistStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api_token_digest", &"[REDACTED]")
            .field("pool", &self.inner.pool.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the production state on a `PostgreSQL` pool.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the courier HTTP client cannot be built.
    pub fn new(config: &AdminConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let stores = Stores::postgres(&pool);
        Self::from_parts(&config.api_token, Some(pool), stores, config.courier)
    }

    /// Build state from explicit stores. `pool` is only used by the
    /// readiness check; without one the service reports not ready.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the courier HTTP client cannot be built.
    pub fn from_parts(
        api_token: &SecretString,
        pool: Option<PgPool>,
        stores: Stores,
        courier: CourierRuntimeConfig,
    ) -> Result<Self, reqwest::Error> {
        let http = build_client(courier.http_timeout)?;
        let resolver = SettingsResolver::new(stores.settings, courier.settings_ttl);
        let couriers = CourierGateway::new(http, resolver);

        let fraud = FraudEvaluator::new(
            stores.blacklist.clone(),
            stores.orders.clone(),
            stores.users,
            Arc::new(couriers.clone()),
        );
        let assignment = CourierAssignmentService::new(stores.orders);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                api_token_digest: digest(api_token.expose_secret()),
                pool,
                couriers,
                fraud,
                assignment,
                blacklist: stores.blacklist,
            }),
        })
    }

    /// Database pool, when running against `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn couriers(&self) -> &CourierGateway {
        &self.inner.couriers
    }

    #[must_use]
    pub fn fraud(&self) -> &FraudEvaluator {
        &self.inner.fraud
    }

    #[must_use]
    pub fn assignment(&self) -> &CourierAssignmentService {
        &self.inner.assignment
    }

    #[must_use]
    pub fn blacklist(&self) -> &dyn BlacklistStore {
        self.inner.blacklist.as_ref()
    }

    /// Check a presented bearer token against the configured one.
    ///
    /// Both sides are hashed first so the comparison time does not depend
    /// on how much of the token matched.
    #[must_use]
    pub fn verify_api_token(&self, presented: &str) -> bool {
        digest(presented) == self.inner.api_token_digest
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{
        InMemoryBlacklistStore, InMemoryOrderStore, InMemorySettingsStore, InMemoryUserStore,
    };

    fn state() -> AppState {
        let stores = Stores {
            settings: Arc::new(InMemorySettingsStore::new()),
            orders: Arc::new(InMemoryOrderStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            blacklist: Arc::new(InMemoryBlacklistStore::new()),
        };
        AppState::from_parts(
            &SecretString::from("k7Qp2Zx9Lm4Rt8Vw1Ys6Bn3Hc5Jd0Fg"),
            None,
            stores,
            CourierRuntimeConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_api_token() {
        let state = state();
        assert!(state.verify_api_token("k7Qp2Zx9Lm4Rt8Vw1Ys6Bn3Hc5Jd0Fg"));
        assert!(!state.verify_api_token("k7Qp2Zx9Lm4Rt8Vw1Ys6Bn3Hc5Jd0F"));
        assert!(!state.verify_api_token(""));
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", state());
        assert!(!debug.contains("k7Qp2Zx9"));
        assert!(debug.contains("pool: false"));
    }
}
