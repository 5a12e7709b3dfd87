//! Integration tests for ParcelHub.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p parcelhub-integration-tests
//! ```
//!
//! No database or network access is needed: stores are the in-memory
//! implementations from `parcelhub-admin` (feature `test-support`) and
//! courier APIs are `httpmock` servers.
//!
//! # Test Categories
//!
//! - `fraud_screening` - Blacklist and delivery-reputation verdicts
//! - `courier_assignment` - Order courier/tracking updates
//! - `courier_settings` - Settings resolution, balance dispatch, unconfigured providers
//! - `admin_api` - Router-level flows through the HTTP surface

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use parcelhub_admin::config::CourierRuntimeConfig;
use parcelhub_admin::couriers::COURIER_GROUP;
use parcelhub_admin::db::{
    InMemoryBlacklistStore, InMemoryOrderStore, InMemorySettingsStore, InMemoryUserStore,
    OrderRecord,
};
use parcelhub_admin::routes;
use parcelhub_admin::state::{AppState, Stores};
use parcelhub_core::{OrderId, OrderStatus, UserId};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

/// Bearer token accepted by [`TestContext`] routers.
pub const API_TOKEN: &str = "k7Qp2Zx9Lm4Rt8Vw1Ys6Bn3Hc5Jd0Fg";

/// In-memory stores plus the state built on them.
pub struct TestContext {
    pub settings: Arc<InMemorySettingsStore>,
    pub orders: Arc<InMemoryOrderStore>,
    pub users: Arc<InMemoryUserStore>,
    pub blacklist: Arc<InMemoryBlacklistStore>,
    pub state: AppState,
}

impl TestContext {
    /// Context whose `courier` settings group holds `courier_settings`.
    /// Settings are read from the store on every resolve.
    pub fn new(courier_settings: &[(&str, &str)]) -> Self {
        Self::with_settings_ttl(courier_settings, Duration::ZERO)
    }

    /// Like [`TestContext::new`], caching resolved groups for `settings_ttl`.
    pub fn with_settings_ttl(courier_settings: &[(&str, &str)], settings_ttl: Duration) -> Self {
        let settings = Arc::new(InMemorySettingsStore::with_group(
            COURIER_GROUP,
            courier_settings,
        ));
        let orders = Arc::new(InMemoryOrderStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let blacklist = Arc::new(InMemoryBlacklistStore::new());

        let stores = Stores {
            settings: settings.clone(),
            orders: orders.clone(),
            users: users.clone(),
            blacklist: blacklist.clone(),
        };
        let courier = CourierRuntimeConfig {
            settings_ttl,
            http_timeout: Duration::from_secs(5),
        };
        let state =
            AppState::from_parts(&SecretString::from(API_TOKEN), None, stores, courier).unwrap();

        Self {
            settings,
            orders,
            users,
            blacklist,
            state,
        }
    }

    /// Full application router.
    pub fn router(&self) -> Router {
        routes::routes().with_state(self.state.clone())
    }

    /// Send one request through the router. `body` is sent as JSON.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        authorized: bool,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if authorized {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {API_TOKEN}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

/// An order with only the fields the courier and fraud components read.
pub fn order(id: i64, user_id: Option<i64>, guest_phone: Option<&str>) -> OrderRecord {
    OrderRecord {
        id: OrderId::new(id),
        user_id: user_id.map(UserId::new),
        guest_phone: guest_phone.map(ToString::to_string),
        guest_email: None,
        ip_address: None,
        status: OrderStatus::Processing,
        courier_name: None,
        tracking_code: None,
    }
}

/// Steadfast credentials pointing at `base_url`.
pub fn steadfast_settings(base_url: &str) -> Vec<(&'static str, String)> {
    vec![
        ("steadfast_api_key", "sf-key".to_string()),
        ("steadfast_secret_key", "sf-secret".to_string()),
        ("steadfast_base_url", base_url.to_string()),
    ]
}

/// Borrow owned `(key, value)` pairs for [`TestContext::new`].
pub fn pairs<'a>(owned: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    owned.iter().map(|(k, v)| (*k, v.as_str())).collect()
}
