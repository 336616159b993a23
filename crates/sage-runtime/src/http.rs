//! Shared HTTP plumbing for the REST-based providers

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use sage_core::{CoreError, Result};

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CoreError::Config(format!("failed to build HTTP client: {e}")))
}

/// Classify a transport-level failure
pub(crate) fn transport_error(err: &reqwest::Error) -> CoreError {
    if err.is_timeout() || err.is_connect() {
        CoreError::ProviderUnavailable(err.to_string())
    } else {
        CoreError::Provider(err.to_string())
    }
}

/// Map a non-success HTTP status onto the error taxonomy
pub(crate) fn status_error(status: StatusCode, body: &str) -> CoreError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CoreError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => CoreError::RateLimited(detail),
        s if s.is_server_error() => CoreError::ProviderUnavailable(detail),
        _ => CoreError::Provider(detail),
    }
}

/// Fail on non-2xx, otherwise hand the response back
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body.trim()))
}
