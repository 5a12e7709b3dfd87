//! Settings table access.
//!
//! Rows are `{key, value, group}` with `key` unique across groups. The
//! courier integration only reads through [`SettingsStore::find_many`];
//! writes come from the CLI and the Pathao token refresh route.

use async_trait::async_trait;
use sqlx::PgPool;

use super::RepositoryError;

/// A single settings row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SettingRow {
    pub key: String,
    pub value: String,
    pub group: String,
}

/// Storage seam for grouped key/value settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// All rows in `group`, oldest write first.
    async fn find_many(&self, group: &str) -> Result<Vec<SettingRow>, RepositoryError>;

    /// Insert or overwrite `key`, moving it into `group`.
    async fn upsert(&self, key: &str, value: &str, group: &str) -> Result<(), RepositoryError>;
}

/// `PostgreSQL` settings store.
#[derive(Debug, Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    /// Create a new settings store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn find_many(&self, group: &str) -> Result<Vec<SettingRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, SettingRow>(
            r#"
            SELECT key, value, "group"
            FROM settings
            WHERE "group" = $1
            ORDER BY updated_at, key
            "#,
        )
        .bind(group)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn upsert(&self, key: &str, value: &str, group: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, "group")
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, "group" = EXCLUDED."group", updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(group)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
