//! HTTP fetcher
//!
//! One GET per poll cycle, bounded by a wall-clock timeout. The reqwest client
//! is shared by every sensor and owned by the runtime.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Http(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeaderError {
    #[error("invalid header name `{0}`")]
    Name(String),
    #[error("invalid value for header `{0}`")]
    Value(String),
}

/// Builds the request headers; a non-empty static authorization value
/// replaces any configured `Authorization` entry, whatever its casing.
pub fn build_headers(
    headers: &BTreeMap<String, String>,
    authorization: Option<&str>,
) -> Result<HeaderMap, HeaderError> {
    let mut map = HeaderMap::with_capacity(headers.len() + 1);
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HeaderError::Name(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| HeaderError::Value(name.clone()))?;
        map.insert(header_name, header_value);
    }

    if let Some(auth) = authorization.filter(|a| !a.is_empty()) {
        let mut value = HeaderValue::from_str(auth)
            .map_err(|_| HeaderError::Value(AUTHORIZATION.to_string()))?;
        value.set_sensitive(true);
        map.insert(AUTHORIZATION, value);
    }

    Ok(map)
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Single attempt, no retry. Non-200 answers are not read.
    pub async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<Value, FetchError> {
        match tokio::time::timeout(self.timeout, self.request(url, headers)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }

    async fn request(&self, url: &Url, headers: &HeaderMap) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!(url = %url, bytes = body.len(), "response received");

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::Transport(format!("invalid JSON body: {e}")))
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}
