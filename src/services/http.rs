//! Shared GET-and-decode helper for the upstream feeds.

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use crate::error::{ConfigError, FetchError};

/// Upper bound on how much of an error body is kept in a `FetchError`
const MAX_ERROR_BODY_CHARS: usize = 512;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a client with explicit timeouts; the upstream APIs document none.
pub fn build_client(timeout: Duration, user_agent: Option<&str>) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT);

    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent.to_string());
    }

    builder.build().map_err(ConfigError::HttpClient)
}

/// Send the request and decode the body as JSON.
///
/// The body is read as text first so that a malformed payload is reported as
/// `InvalidJson` rather than a transport error.
pub async fn get_json(url: &str, request: RequestBuilder) -> Result<Value, FetchError> {
    let response = request
        .header("accept", "application/json")
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    serde_json::from_str(&body).map_err(|source| FetchError::InvalidJson {
        url: url.to_string(),
        source,
    })
}
