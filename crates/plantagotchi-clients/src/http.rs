//! Shared request plumbing for the lookup clients.

use std::time::Duration;

use plantagotchi_core::LookupError;

/// Longest slice of an error body kept in [`LookupError::Status`].
const MAX_ERROR_BODY: usize = 256;

/// Build a `reqwest` client with a whole-request timeout.
pub(crate) fn build_client(timeout_ms: u64) -> Result<reqwest::Client, LookupError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| LookupError::Config(format!("failed to build HTTP client: {e}")))
}

/// Send `request` and decode a successful response as JSON.
pub(crate) async fn fetch_json(
    request: reqwest::RequestBuilder,
    api: &str,
    timeout_ms: u64,
) -> Result<serde_json::Value, LookupError> {
    let response = request
        .send()
        .await
        .map_err(|e| request_error(&e, api, timeout_ms))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(LookupError::Status {
            status: status.as_u16(),
            body: truncate(&body),
        });
    }

    response
        .json()
        .await
        .map_err(|e| request_error(&e, api, timeout_ms))
}

fn request_error(e: &reqwest::Error, api: &str, timeout_ms: u64) -> LookupError {
    if e.is_timeout() {
        LookupError::Timeout(timeout_ms)
    } else if e.is_decode() {
        LookupError::Parse(format!("{api} response is not JSON: {e}"))
    } else {
        LookupError::Network(format!("{api} request failed: {e}"))
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        assert_eq!(truncate(&body).len(), MAX_ERROR_BODY);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(build_client(5000).is_ok());
    }
}
