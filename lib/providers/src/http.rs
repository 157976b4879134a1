//! Blocking JSON-over-HTTP plumbing shared by the clients.

use reframe_core::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Build a client with JSON content type and an optional bearer token
pub(crate) fn build_client(service: &str, timeout: Duration, bearer: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(token) = bearer {
        let auth = format!("Bearer {}", token.trim());
        let value = HeaderValue::from_str(&auth)
            .map_err(|_| Error::InvalidConfig(format!("invalid {} API key", service)))?;
        headers.insert(AUTHORIZATION, value);
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| Error::transport(service, format!("failed to build HTTP client: {}", e)))
}

/// POST `body` to `url` and decode the JSON reply.
///
/// Network failures, non-2xx statuses and undecodable bodies are all
/// reported as transport errors.
pub(crate) fn post_json<B, R>(client: &Client, service: &str, url: &str, body: &B) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    debug!("POST {}", url);
    let resp = client
        .post(url)
        .json(body)
        .send()
        .map_err(|e| Error::transport(service, format!("request to {} failed: {}", url, e)))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp
            .text()
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        return Err(Error::transport(service, format!("{} returned {}: {}", url, status, text)));
    }

    resp.json()
        .map_err(|e| Error::transport(service, format!("failed to parse response: {}", e)))
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
