//! Request transport. [`HttpTransport`] posts JSON over HTTP; tests plug in
//! their own [`Transport`].

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// One outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub uri: String,
    /// The `{ query, variables }` envelope.
    pub body: Value,
}

/// Raw response: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Connectivity-class failures are worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// `reqwest`-backed transport sending every request as a JSON `POST`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a client with the configured connect timeout and default headers.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidSetting`] for malformed headers or when
    /// the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let headers = default_headers(config)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::InvalidSetting {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (key, value) in &config.headers {
        let name = HeaderName::from_str(key).map_err(|e| ClientError::InvalidSetting {
            message: format!("header name '{key}': {e}"),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| ClientError::InvalidSetting {
            message: format!("header '{key}' value: {e}"),
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(&request.uri)
            .json(&request.body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;
        Ok(TransportResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_errors_are_retryable() {
        assert!(TransportError::Connect("refused".into()).is_retryable());
        assert!(TransportError::Timeout.is_retryable());
        assert!(!TransportError::Request("bad body".into()).is_retryable());
    }

    #[test]
    fn configured_headers_are_validated() {
        let mut config = ClientConfig::default();
        config.headers.insert("x-api-key".into(), "secret".into());
        let headers = default_headers(&config).unwrap();
        assert_eq!(headers["x-api-key"], "secret");
        assert_eq!(headers[CONTENT_TYPE], "application/json");

        config.headers.insert("bad header".into(), "x".into());
        assert!(matches!(
            default_headers(&config),
            Err(ClientError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn failure_status() {
        assert!(TransportResponse::new(500, "").is_failure());
        assert!(!TransportResponse::new(200, "{}").is_failure());
    }
}
