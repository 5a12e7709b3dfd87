//! Blacklist commands.

use parcelhub_admin::db::{BlacklistStore, NewBlacklistEntry, PgBlacklistStore, normalize_value};
use parcelhub_core::{BlacklistEntryId, BlacklistKind};

use super::{CliError, connect};

/// Add an entry after normalizing the value.
///
/// # Errors
///
/// Returns `CliError::Invalid` for an unknown kind or malformed value, or a
/// repository error (including a duplicate value).
pub async fn add(kind: &str, value: &str, reason: Option<String>) -> Result<(), CliError> {
    let kind: BlacklistKind = kind
        .parse()
        .map_err(|e: parcelhub_core::ParseEnumError| CliError::Invalid(e.to_string()))?;
    let value = normalize_value(kind, value).map_err(|e| CliError::Invalid(e.to_string()))?;
    if value.is_empty() {
        return Err(CliError::Invalid("value cannot be empty".to_string()));
    }

    let store = PgBlacklistStore::new(connect().await?);
    let entry = store
        .create(&NewBlacklistEntry {
            kind,
            value,
            reason,
        })
        .await?;

    tracing::info!(
        "Blacklisted {} {} (ID: {})",
        entry.kind,
        entry.value,
        entry.id
    );
    Ok(())
}

/// List entries, newest first.
///
/// # Errors
///
/// Returns `CliError` on database failure.
pub async fn list() -> Result<(), CliError> {
    let entries = PgBlacklistStore::new(connect().await?).list().await?;

    tracing::info!("{} blacklist entries", entries.len());
    for entry in entries {
        tracing::info!(
            "  [{}] {} {} ({}) {}",
            entry.id,
            entry.kind,
            entry.value,
            entry.created_at.format("%Y-%m-%d"),
            entry.reason.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Remove an entry by ID.
///
/// # Errors
///
/// Returns a repository `NotFound` error if the entry does not exist.
pub async fn remove(id: i64) -> Result<(), CliError> {
    PgBlacklistStore::new(connect().await?)
        .delete(BlacklistEntryId::new(id))
        .await?;

    tracing::info!("Removed blacklist entry {}", id);
    Ok(())
}
