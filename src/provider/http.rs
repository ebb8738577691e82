//! HTTP client construction, auth headers, and status mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::CourierError;

const MODEL_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build a client for model-service calls.
pub fn build_client() -> Result<reqwest::Client, CourierError> {
    Ok(reqwest::Client::builder()
        .timeout(MODEL_REQUEST_TIMEOUT)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Headers for Azure OpenAI (`api-key`).
pub fn api_key_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(api_key) {
        headers.insert("api-key", val);
    }
    headers
}

/// Map a non-200 status and body to an error.
pub fn status_to_error(status: u16, body: &str) -> CourierError {
    match status {
        401 | 403 => CourierError::Authentication(body.to_string()),
        429 => CourierError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => CourierError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}
