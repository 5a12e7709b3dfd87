//! Settings commands.
//!
//! # Usage
//!
//! ```bash
//! parcelhub-cli settings seed
//! parcelhub-cli settings set pathao_store_id 1234
//! parcelhub-cli settings list --group courier
//! ```

use std::collections::HashSet;

use parcelhub_admin::couriers::settings::COURIER_KEYS;
use parcelhub_admin::couriers::COURIER_GROUP;
use parcelhub_admin::db::{PgSettingsStore, SettingsStore};

use super::{CliError, connect};

const SECRET_MARKERS: &[&str] = &["key", "secret", "password", "token"];

/// Insert an empty value for every courier key that has no row yet.
///
/// # Errors
///
/// Returns `CliError` on database failure.
pub async fn seed() -> Result<(), CliError> {
    let store = PgSettingsStore::new(connect().await?);

    let existing: HashSet<String> = store
        .find_many(COURIER_GROUP)
        .await?
        .into_iter()
        .map(|row| row.key)
        .collect();

    let mut inserted = 0;
    for key in COURIER_KEYS.iter().filter(|k| !existing.contains(**k)) {
        store.upsert(key, "", COURIER_GROUP).await?;
        inserted += 1;
    }

    tracing::info!(
        "Seeded {} courier settings ({} already present)",
        inserted,
        existing.len()
    );
    Ok(())
}

/// Set one value.
///
/// # Errors
///
/// Returns `CliError::Invalid` for a blank key, or a database error.
pub async fn set(key: &str, value: &str, group: &str) -> Result<(), CliError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::Invalid("key cannot be empty".to_string()));
    }
    if group == COURIER_GROUP && !COURIER_KEYS.contains(&key) {
        tracing::warn!("{key} is not a known courier setting");
    }

    PgSettingsStore::new(connect().await?)
        .upsert(key, value.trim(), group)
        .await?;

    tracing::info!("Set {} in group {}", key, group);
    Ok(())
}

/// List a group, masking credential values.
///
/// # Errors
///
/// Returns `CliError` on database failure.
pub async fn list(group: &str) -> Result<(), CliError> {
    let rows = PgSettingsStore::new(connect().await?)
        .find_many(group)
        .await?;

    tracing::info!("{} settings in group {}", rows.len(), group);
    for row in rows {
        tracing::info!("  {} = {}", row.key, display_value(&row.key, &row.value));
    }
    Ok(())
}

fn display_value(key: &str, value: &str) -> String {
    if value.is_empty() {
        return "(empty)".to_string();
    }
    if SECRET_MARKERS.iter().any(|m| key.contains(m)) {
        return "********".to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value_masks_secrets() {
        assert_eq!(display_value("steadfast_api_key", "abc"), "********");
        assert_eq!(display_value("pathao_password", "abc"), "********");
        assert_eq!(display_value("redx_access_token", "abc"), "********");
        assert_eq!(display_value("pathao_store_id", "42"), "42");
        assert_eq!(display_value("redx_base_url", ""), "(empty)");
    }
}
