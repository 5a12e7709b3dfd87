//! In-memory store implementations for tests.
//!
//! Enabled under `cfg(test)` and the `test-support` feature. Each store
//! counts its calls so tests can assert that validation happens before any
//! storage access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use parcelhub_core::{BlacklistEntryId, BlacklistKind, OrderId, UserId};

use super::{
    BlacklistEntry, BlacklistStore, CourierUpdate, NewBlacklistEntry, OrderRecord, OrderStore,
    RepositoryError, SettingRow, SettingsStore, UserStore,
};

/// Settings store backed by a `Vec`, preserving write order.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    rows: RwLock<Vec<SettingRow>>,
    reads: AtomicUsize,
}

impl InMemorySettingsStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `(key, value)` pairs in `group`.
    #[must_use]
    pub fn with_group(group: &str, pairs: &[(&str, &str)]) -> Self {
        let rows = pairs
            .iter()
            .map(|(key, value)| SettingRow {
                key: (*key).to_string(),
                value: (*value).to_string(),
                group: group.to_string(),
            })
            .collect();

        Self {
            rows: RwLock::new(rows),
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of `find_many` calls served.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn find_many(&self, group: &str) -> Result<Vec<SettingRow>, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.group == group)
            .cloned()
            .collect())
    }

    async fn upsert(&self, key: &str, value: &str, group: &str) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.retain(|row| row.key != key);
        rows.push(SettingRow {
            key: key.to_string(),
            value: value.to_string(),
            group: group.to_string(),
        });
        Ok(())
    }
}

/// Order store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, OrderRecord>>,
    calls: AtomicUsize,
}

impl InMemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an order.
    pub async fn insert(&self, order: OrderRecord) {
        self.orders.write().await.insert(order.id, order);
    }

    /// Current state of an order, bypassing the call counter.
    pub async fn get(&self, id: OrderId) -> Option<OrderRecord> {
        self.orders.read().await.get(&id).cloned()
    }

    /// Number of trait calls served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update_courier(
        &self,
        id: OrderId,
        update: &CourierUpdate,
    ) -> Result<(), RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        order.courier_name = Some(update.courier_name.clone());
        order.tracking_code = Some(update.tracking_code.clone());
        order.status = update.status;
        Ok(())
    }
}

/// User store mapping user IDs to phone numbers.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    phones: RwLock<HashMap<UserId, Option<String>>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub async fn insert(&self, id: UserId, phone: Option<&str>) {
        self.phones
            .write()
            .await
            .insert(id, phone.map(ToString::to_string));
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn phone(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        Ok(self.phones.read().await.get(&id).cloned().flatten())
    }
}

/// Blacklist store backed by a `Vec`.
#[derive(Debug, Default)]
pub struct InMemoryBlacklistStore {
    entries: RwLock<Vec<BlacklistEntry>>,
    next_id: AtomicUsize,
}

impl InMemoryBlacklistStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlacklistStore for InMemoryBlacklistStore {
    async fn find_first(
        &self,
        matchers: &[(BlacklistKind, String)],
    ) -> Result<Option<BlacklistEntry>, RepositoryError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|entry| {
                matchers
                    .iter()
                    .any(|(kind, value)| entry.kind == *kind && entry.value == *value)
            })
            .cloned())
    }

    async fn list(&self) -> Result<Vec<BlacklistEntry>, RepositoryError> {
        let mut entries = self.entries.read().await.clone();
        entries.reverse();
        Ok(entries)
    }

    async fn create(&self, entry: &NewBlacklistEntry) -> Result<BlacklistEntry, RepositoryError> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|existing| existing.value == entry.value) {
            return Err(RepositoryError::Conflict(format!(
                "{} is already blacklisted",
                entry.value
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = BlacklistEntry {
            id: BlacklistEntryId::new(i64::try_from(id).unwrap_or(i64::MAX)),
            kind: entry.kind,
            value: entry.value.clone(),
            reason: entry.reason.clone(),
            created_at: Utc::now(),
        };
        entries.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: BlacklistEntryId) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
