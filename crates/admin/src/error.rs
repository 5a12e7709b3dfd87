//! Unified error handling for admin.
//!
//! Every error renders as a JSON body with `status: "error"` and a
//! `message`. Missing courier credentials carry `code: "not_configured"`;
//! upstream failures carry the provider's payload as `provider_error`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::couriers::CourierError;
use crate::db::RepositoryError;
use crate::services::{AssignmentError, FraudError};

/// Application-level error type for the admin service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Courier API call or courier configuration failed.
    #[error(transparent)]
    Courier(#[from] CourierError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Duplicate resource.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_error: Option<Value>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Courier(err) => match err {
                CourierError::NotConfigured { .. } | CourierError::InvalidBaseUrl { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CourierError::Validation(_) => StatusCode::BAD_REQUEST,
                CourierError::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
                CourierError::Transport { .. }
                | CourierError::Upstream { .. }
                | CourierError::Parse { .. } => StatusCode::BAD_GATEWAY,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status_code();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) | Self::Courier(CourierError::Settings(_)) => {
                "Internal server error".to_string()
            }
            Self::Courier(err) => err.to_string(),
            _ => self.to_string(),
        };

        let (code, provider_error) = match &self {
            Self::Courier(err) if err.is_not_configured() => (Some("not_configured"), None),
            Self::Courier(err) => (None, err.provider_payload().cloned()),
            _ => (None, None),
        };

        let body = ErrorBody {
            status: "error",
            message,
            code,
            provider_error,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<FraudError> for AppError {
    fn from(err: FraudError) -> Self {
        match err {
            FraudError::MissingIdentifier | FraudError::InvalidPhone(_) | FraudError::NoPhone(_) => {
                Self::BadRequest(err.to_string())
            }
            FraudError::OrderNotFound(id) => Self::NotFound(format!("order {id}")),
            FraudError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<AssignmentError> for AppError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::MissingProvider => Self::BadRequest(err.to_string()),
            AssignmentError::OrderNotFound(id) => Self::NotFound(format!("order {id}")),
            AssignmentError::Repository(e) => Self::Database(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use parcelhub_core::{CourierProvider, OrderId};
    use serde_json::json;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("dup".to_string()))),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_not_configured_is_422_with_code() {
        let err = AppError::from(CourierError::NotConfigured {
            provider: CourierProvider::Steadfast,
            key: "steadfast_api_key",
        });

        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "not_configured");
        assert!(body["message"].as_str().unwrap().contains("steadfast_api_key"));
    }

    #[tokio::test]
    async fn test_upstream_is_502_with_provider_error() {
        let err = AppError::from(CourierError::Upstream {
            provider: CourierProvider::Pathao,
            status: 422,
            body: json!({"message": "recipient_phone is invalid"}),
        });

        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["provider_error"]["message"], "recipient_phone is invalid");
        assert!(body.get("code").is_none());
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "password column leaked".to_string(),
        ));

        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_courier_validation_is_400() {
        let (status, body) =
            body_json(CourierError::Validation("invoice is required".to_string()).into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "invoice is required");
    }

    #[test]
    fn test_service_error_conversions() {
        assert_eq!(
            AppError::from(FraudError::NoPhone(OrderId::new(5))).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(FraudError::OrderNotFound(OrderId::new(5))).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(AssignmentError::MissingProvider).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AssignmentError::OrderNotFound(OrderId::new(5))).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
