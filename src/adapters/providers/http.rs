//! Shared HTTP plumbing for provider adapters.

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ProviderSettings;

pub(crate) fn build_client(provider: &str, timeout_secs: u64) -> DomainResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DomainError::provider(provider, format!("failed to create HTTP client: {}", e), false))
}

/// API key from settings, falling back to the conventional env var.
pub(crate) fn resolve_api_key(settings: &ProviderSettings, env_var: &str) -> Option<String> {
    settings
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|k| !k.trim().is_empty()))
}

/// Whether an HTTP status is worth retrying.
pub(crate) fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

pub(crate) fn send_error(provider: &str, err: reqwest::Error) -> DomainError {
    DomainError::provider(provider, format!("request failed: {}", err), true)
}

/// Turn a non-2xx response into a provider error carrying the body.
pub(crate) async fn ensure_success(provider: &str, response: Response) -> DomainResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string());
    Err(DomainError::provider(
        provider,
        format!("API returned {}: {}", status, body),
        is_transient_status(status),
    ))
}

pub(crate) async fn parse_json<T: serde::de::DeserializeOwned>(
    provider: &str,
    response: Response,
) -> DomainResult<T> {
    response
        .json()
        .await
        .map_err(|e| DomainError::provider(provider, format!("failed to parse response: {}", e), false))
}
