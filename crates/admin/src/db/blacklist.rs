//! Blacklist (deny-list) storage.
//!
//! Entries are unique per `value`. Values are stored normalized (see
//! [`normalize_value`]) so lookups from the fraud evaluator match regardless
//! of how the phone number or email was typed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use parcelhub_core::{BlacklistEntryId, BlacklistKind, Phone, PhoneError};

use super::RepositoryError;

/// A deny-listed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlacklistEntry {
    pub id: BlacklistEntryId,
    #[serde(rename = "type")]
    pub kind: BlacklistKind,
    pub value: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a blacklist entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBlacklistEntry {
    #[serde(rename = "type")]
    pub kind: BlacklistKind,
    pub value: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Normalize a raw identifier for storage and matching.
///
/// Phones go through [`Phone::parse`], emails are lowercased, IPs trimmed.
///
/// # Errors
///
/// Returns `PhoneError` if `kind` is `Phone` and the value is not a phone number.
pub fn normalize_value(kind: BlacklistKind, raw: &str) -> Result<String, PhoneError> {
    match kind {
        BlacklistKind::Phone => Phone::parse(raw).map(Phone::into_inner),
        BlacklistKind::Email => Ok(raw.trim().to_lowercase()),
        BlacklistKind::Ip => Ok(raw.trim().to_string()),
    }
}

/// Storage seam for the blacklist.
#[async_trait]
pub trait BlacklistStore: Send + Sync {
    /// First entry matching any `(kind, value)` pair, if any.
    async fn find_first(
        &self,
        matchers: &[(BlacklistKind, String)],
    ) -> Result<Option<BlacklistEntry>, RepositoryError>;

    /// All entries, newest first.
    async fn list(&self) -> Result<Vec<BlacklistEntry>, RepositoryError>;

    /// Insert an entry. Returns `RepositoryError::Conflict` for a duplicate value.
    async fn create(&self, entry: &NewBlacklistEntry) -> Result<BlacklistEntry, RepositoryError>;

    /// Delete an entry. Returns `RepositoryError::NotFound` if absent.
    async fn delete(&self, id: BlacklistEntryId) -> Result<(), RepositoryError>;
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct BlacklistRow {
    id: i64,
    kind: String,
    value: String,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BlacklistRow> for BlacklistEntry {
    type Error = RepositoryError;

    fn try_from(row: BlacklistRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse::<BlacklistKind>().map_err(|e| {
            RepositoryError::DataCorruption(format!("blacklist entry {}: {e}", row.id))
        })?;

        Ok(Self {
            id: BlacklistEntryId::new(row.id),
            kind,
            value: row.value,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

/// `PostgreSQL` blacklist store.
#[derive(Debug, Clone)]
pub struct PgBlacklistStore {
    pool: PgPool,
}

impl PgBlacklistStore {
    /// Create a new blacklist store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlacklistStore for PgBlacklistStore {
    async fn find_first(
        &self,
        matchers: &[(BlacklistKind, String)],
    ) -> Result<Option<BlacklistEntry>, RepositoryError> {
        if matchers.is_empty() {
            return Ok(None);
        }

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT id, kind, value, reason, created_at FROM blacklist_entries WHERE ",
        );
        let mut clauses = query.separated(" OR ");
        for (kind, value) in matchers {
            clauses.push("(kind = ");
            clauses.push_bind_unseparated(kind.as_str());
            clauses.push_unseparated(" AND value = ");
            clauses.push_bind_unseparated(value.clone());
            clauses.push_unseparated(")");
        }
        query.push(" ORDER BY id LIMIT 1");

        let row = query
            .build_query_as::<BlacklistRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(BlacklistEntry::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<BlacklistEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, BlacklistRow>(
            r"
            SELECT id, kind, value, reason, created_at
            FROM blacklist_entries
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BlacklistEntry::try_from).collect()
    }

    async fn create(&self, entry: &NewBlacklistEntry) -> Result<BlacklistEntry, RepositoryError> {
        let row = sqlx::query_as::<_, BlacklistRow>(
            r"
            INSERT INTO blacklist_entries (kind, value, reason)
            VALUES ($1, $2, $3)
            RETURNING id, kind, value, reason, created_at
            ",
        )
        .bind(entry.kind.as_str())
        .bind(&entry.value)
        .bind(&entry.reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("{} is already blacklisted", entry.value))
            }
            other => RepositoryError::Database(other),
        })?;

        BlacklistEntry::try_from(row)
    }

    async fn delete(&self, id: BlacklistEntryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM blacklist_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
