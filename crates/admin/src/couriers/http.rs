//! Shared HTTP plumbing for courier clients.

use std::time::Duration;

use parcelhub_core::CourierProvider;
use reqwest::RequestBuilder;
use serde_json::Value;

use super::CourierError;

/// Build the shared HTTP client used by every courier adapter.
///
/// # Errors
///
/// Returns `reqwest::Error` if the TLS backend cannot be initialized.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("parcelhub/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Join a configured base URL and an endpoint path.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Parse a base URL + path so query parameters can be appended.
pub(crate) fn endpoint_url(
    provider: CourierProvider,
    base_url: &str,
    path: &str,
) -> Result<url::Url, CourierError> {
    url::Url::parse(&endpoint(base_url, path))
        .map_err(|source| CourierError::InvalidBaseUrl { provider, source })
}

/// Send a request and return the response body as JSON.
///
/// 2xx bodies are returned verbatim (an empty body becomes `null`, a non-JSON
/// body a JSON string). Anything else becomes `CourierError::Upstream` with
/// the provider's payload attached.
///
/// # Errors
///
/// Returns `CourierError::Transport` if no response was received and
/// `CourierError::Upstream` for non-2xx responses.
pub(crate) async fn send_json(
    provider: CourierProvider,
    request: RequestBuilder,
) -> Result<Value, CourierError> {
    let response = request.send().await.map_err(|source| {
        tracing::error!(provider = %provider, error = %source, "Courier request failed");
        CourierError::Transport { provider, source }
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|source| {
        tracing::error!(provider = %provider, error = %source, "Failed to read courier response");
        CourierError::Transport { provider, source }
    })?;

    let body = parse_body(&text);

    if status.is_success() {
        tracing::debug!(provider = %provider, status = status.as_u16(), "Courier request succeeded");
        return Ok(body);
    }

    tracing::error!(
        provider = %provider,
        status = status.as_u16(),
        body = %text,
        "Courier returned an error response"
    );

    Err(CourierError::Upstream {
        provider,
        status: status.as_u16(),
        body,
    })
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
