//! Blacklist management.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get},
};
use parcelhub_core::BlacklistEntryId;
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiResponse};
use crate::db::{BlacklistEntry, NewBlacklistEntry, normalize_value};
use crate::error::AppError;
use crate::middleware::RequireAdminToken;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/blacklist", get(list).post(create))
        .route("/api/blacklist/{id}", delete(remove))
}

/// GET /api/blacklist - All entries, newest first.
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    _: RequireAdminToken,
) -> Result<Json<ApiResponse<Vec<BlacklistEntry>>>, AppError> {
    let entries = state.blacklist().list().await?;
    Ok(ApiResponse::success(
        format!("{} blacklist entries", entries.len()),
        entries,
    ))
}

/// POST /api/blacklist - Add an entry. The value is normalized first.
#[instrument(skip(state, input), fields(kind = %input.kind))]
async fn create(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiJson(input): ApiJson<NewBlacklistEntry>,
) -> Result<Json<ApiResponse<BlacklistEntry>>, AppError> {
    let value = normalize_value(input.kind, &input.value)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if value.is_empty() {
        return Err(AppError::BadRequest("value is required".to_string()));
    }

    let entry = NewBlacklistEntry {
        kind: input.kind,
        value,
        reason: input
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
    };

    let created = state.blacklist().create(&entry).await?;
    tracing::info!(id = %created.id, "Blacklist entry created");

    Ok(ApiResponse::success("Blacklist entry created", created))
}

/// DELETE /api/blacklist/{id}
#[instrument(skip(state))]
async fn remove(
    State(state): State<AppState>,
    _: RequireAdminToken,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.blacklist().delete(BlacklistEntryId::new(id)).await?;
    Ok(ApiResponse::ok("Blacklist entry removed"))
}
