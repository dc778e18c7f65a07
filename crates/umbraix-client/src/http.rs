//! Shared HTTP plumbing: client construction and error-body handling.
use std::time::Duration;

use crate::errors::ClientError;
use crate::model::ProviderId;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Builds the shared client. Total request timeouts are set per request so
/// streamed bodies are not cut off.
pub(crate) fn build_client() -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))
}

/// Extracts the best human-readable message from an error response body.
///
/// Accepts `{"error": "..."}`, `{"error": {"message": "..."}}` and a top-level
/// `{"message": "..."}`; anything else falls back to the status code.
pub fn error_message_from_body(body: &str, status: u16) -> String {
    let fallback = || format!("HTTP error! status: {status}");
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };
    let from_error = value.get("error").and_then(|error| match error {
        serde_json::Value::String(message) => Some(message.as_str()),
        serde_json::Value::Object(_) => error.get("message").and_then(|m| m.as_str()),
        _ => None,
    });
    from_error
        .or_else(|| value.get("message").and_then(|m| m.as_str()))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(fallback)
}

/// Sends a prepared request and turns non-success statuses into `ClientError::Http`.
pub(crate) async fn send_checked(
    provider: &ProviderId,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::transport(provider.clone(), format!("request failed: {e}")))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message_from_body(&body, status.as_u16());
    tracing::debug!(provider = %provider, status = status.as_u16(), %message, "upstream returned error status");
    Err(ClientError::http(provider.clone(), status.as_u16(), message))
}

/// Reads a JSON body, mapping decode failures to protocol errors.
pub(crate) async fn read_json(
    provider: &ProviderId,
    response: reqwest::Response,
) -> Result<serde_json::Value, ClientError> {
    let bytes = response.bytes().await.map_err(|e| {
        ClientError::transport(provider.clone(), format!("failed to read body: {e}"))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        ClientError::protocol(provider.clone(), format!("response is not valid JSON: {e}"))
    })
}
