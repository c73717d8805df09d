//! HTTP transport for the completion client
//!
//! The client's retry policy only needs to know *how* a request failed, so the
//! transport classifies failures into [`TransportError`] and leaves every
//! decision about retrying to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Classified failure of a single HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not connect or the connection dropped
    Connect(String),
    /// The request exceeded its timeout
    Timeout(String),
    /// The server answered with a non-success status
    Status { status: u16, body: String },
    /// The exchange succeeded but the body was not JSON
    Decode(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(msg) => write!(f, "connection failed: {}", msg),
            Self::Timeout(msg) => write!(f, "request timed out: {}", msg),
            Self::Status { status, body } => write!(f, "HTTP {}: {}", status, body),
            Self::Decode(msg) => write!(f, "invalid response body: {}", msg),
        }
    }
}

/// Sends JSON requests to the completion server
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON payload and decode the JSON reply
    async fn post_json(&self, url: &str, payload: &Value) -> std::result::Result<Value, TransportError>;

    /// GET a JSON document with a per-request timeout
    async fn get_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<Value, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: HttpClient,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::NetworkError)?;
        Ok(Self { http_client })
    }

    async fn finish(response: reqwest::Response) -> std::result::Result<Value, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Connect(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> std::result::Result<Value, TransportError> {
        debug!(url = %url, "POST completion request");
        let response = self
            .http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(classify)?;
        Self::finish(response).await
    }

    async fn get_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<Value, TransportError> {
        let response = self
            .http_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;
        Self::finish(response).await
    }
}
