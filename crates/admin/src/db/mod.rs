//! Database operations for the admin `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `settings` - Grouped key/value settings (courier credentials live in group `courier`)
//! - `blacklist_entries` - Deny-list of risky phone numbers, IPs and emails
//! - `orders` - Domestic orders (owned by the order service; courier columns written here)
//! - `users` - Registered customers (owned by the user service; phone read here)
//!
//! Each table is reached through an async trait so services can be exercised
//! against the in-memory implementations in [`memory`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p parcelhub-cli -- migrate
//! ```

pub mod blacklist;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod orders;
pub mod settings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use blacklist::{
    BlacklistEntry, BlacklistStore, NewBlacklistEntry, PgBlacklistStore, normalize_value,
};
#[cfg(any(test, feature = "test-support"))]
pub use memory::{InMemoryBlacklistStore, InMemoryOrderStore, InMemorySettingsStore, InMemoryUserStore};
pub use orders::{CourierUpdate, OrderRecord, OrderStore, PgOrderStore};
pub use settings::{PgSettingsStore, SettingRow, SettingsStore};
pub use users::{PgUserStore, UserStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate blacklist value).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
