//! Completion client for a local Ollama-compatible server
//!
//! Provides:
//! - Chat completions returning a best-effort JSON object
//! - Client-side rate limiting (minimum interval between request starts)
//! - Retry with geometric backoff and jitter on connection, timeout and 5xx failures

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::json::{extract_message_content, parse_json};
use super::transport::{HttpTransport, Transport, TransportError};
use super::types::{ChatRequest, ModelParams};
use super::CompletionService;

/// Default server address
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Default model name
pub const DEFAULT_MODEL: &str = "deepseek-r1:32b";

/// Growth factor applied to the backoff after every failed attempt
pub const BACKOFF_GROWTH: f64 = 1.7;

/// Upper bound (exclusive) of the random jitter added to each backoff, in milliseconds
pub const MAX_JITTER_MS: u64 = 500;

const PING_TIMEOUT: Duration = Duration::from_secs(3);
const MODELS_TIMEOUT: Duration = Duration::from_secs(5);

/// Rate limiting and retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Minimum time between the starts of two requests
    pub min_interval: Duration,
    /// Total attempts before a transient failure is surfaced
    pub max_attempts: u32,
    /// Backoff before the first retry
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(1200),
            max_attempts: 5,
            backoff: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from configuration
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            min_interval: Duration::from_millis(config.min_interval_ms),
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// A policy that never sleeps; useful for tests and local batch runs
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            min_interval: Duration::ZERO,
            max_attempts: max_attempts.max(1),
            backoff: Duration::ZERO,
        }
    }
}

/// Completion client
///
/// Requests are throttled per instance: the floor between request starts holds
/// across calls, not only between retries of one call.
pub struct CompletionClient<T: Transport = HttpTransport> {
    transport: T,
    host: String,
    model: String,
    policy: RetryPolicy,
    last_request_start: Mutex<Option<Instant>>,
}

impl<T: Transport> std::fmt::Debug for CompletionClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("host", &self.host)
            .field("model", &self.model)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builder for creating a CompletionClient over HTTP
pub struct CompletionClientBuilder {
    host: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    policy: Option<RetryPolicy>,
}

impl Default for CompletionClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            host: None,
            model: None,
            timeout_secs: None,
            policy: None,
        }
    }

    /// Start from configuration values
    pub fn config(mut self, config: &LlmConfig) -> Self {
        self.host = Some(config.host.clone());
        self.model = Some(config.model.clone());
        self.timeout_secs = Some(config.timeout_secs);
        self.policy = Some(RetryPolicy::from_config(config));
        self
    }

    /// Set the server address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the per-request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the retry policy
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<CompletionClient> {
        let timeout = Duration::from_secs(self.timeout_secs.unwrap_or(600));
        let transport = HttpTransport::new(timeout)?;

        let mut client = CompletionClient::with_transport(
            transport,
            self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        );
        if let Some(policy) = self.policy {
            client.policy = policy;
        }
        Ok(client)
    }
}

impl CompletionClient {
    /// Create a new builder
    pub fn builder() -> CompletionClientBuilder {
        CompletionClientBuilder::new()
    }

    /// Create an HTTP client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        CompletionClientBuilder::new().config(config).build()
    }
}

impl<T: Transport> CompletionClient<T> {
    /// Create a client over an arbitrary transport with the default policy
    pub fn with_transport(transport: T, host: impl Into<String>, model: impl Into<String>) -> Self {
        let host: String = host.into();
        Self {
            transport,
            host: host.trim_end_matches('/').to_string(),
            model: model.into(),
            policy: RetryPolicy::default(),
            last_request_start: Mutex::new(None),
        }
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Update parts of the retry policy; `None` keeps the current value
    pub fn set_retry(
        &mut self,
        min_interval: Option<Duration>,
        max_attempts: Option<u32>,
        backoff: Option<Duration>,
    ) {
        if let Some(min_interval) = min_interval {
            self.policy.min_interval = min_interval;
        }
        if let Some(max_attempts) = max_attempts {
            self.policy.max_attempts = max_attempts.max(1);
        }
        if let Some(backoff) = backoff {
            self.policy.backoff = backoff;
        }
    }

    /// Switch the model
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Current model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Server address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current retry policy
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// True if the server answers the tags endpoint
    pub async fn ping(&self) -> bool {
        self.transport
            .get_json(&format!("{}/api/tags", self.host), PING_TIMEOUT)
            .await
            .is_ok()
    }

    /// Names of the models the server has available; empty on any failure
    pub async fn models(&self) -> Vec<String> {
        let Ok(tags) = self
            .transport
            .get_json(&format!("{}/api/tags", self.host), MODELS_TIMEOUT)
            .await
        else {
            return Vec::new();
        };

        tags.get("models")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Send a chat request and return the server's reply unparsed
    pub async fn generate_raw(
        &self,
        system_prompt: &str,
        user_text: &str,
        params: &ModelParams,
    ) -> Result<Value> {
        let request = ChatRequest::new(&self.model, system_prompt, user_text, params);
        let payload = serde_json::to_value(&request)?;
        self.send_with_retry(&format!("{}/api/chat", self.host), &payload)
            .await
    }

    /// Send a chat request and parse the reply's text into a JSON object
    ///
    /// Unparseable text yields an empty object rather than an error.
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_text: &str,
        params: &ModelParams,
    ) -> Result<Map<String, Value>> {
        let reply = self.generate_raw(system_prompt, user_text, params).await?;
        Ok(reply_to_object(&reply))
    }

    /// Execute a request with throttling and retry
    async fn send_with_retry(&self, url: &str, payload: &Value) -> Result<Value> {
        let mut attempts = 0;
        let mut backoff = self.policy.backoff;

        loop {
            self.throttle().await;

            debug!(url = %url, attempt = attempts + 1, "Sending completion request");

            match self.transport.post_json(url, payload).await {
                Ok(reply) => return Ok(reply),
                Err(TransportError::Decode(msg)) => {
                    warn!(error = %msg, "Completion reply was not JSON, treating as empty");
                    return Ok(Value::Object(Map::new()));
                }
                Err(err @ (TransportError::Connect(_) | TransportError::Timeout(_))) => {
                    attempts += 1;
                    if attempts >= self.policy.max_attempts {
                        return Err(Error::Transport {
                            attempts,
                            message: err.to_string(),
                        });
                    }
                    warn!(attempt = attempts, backoff_ms = backoff.as_millis() as u64, error = %err, "Transient failure, retrying");
                    backoff = sleep_backoff(backoff).await;
                }
                Err(TransportError::Status { status, body }) => {
                    attempts += 1;
                    let retryable = (500..600).contains(&status);
                    if !retryable || attempts >= self.policy.max_attempts {
                        return Err(Error::HttpStatus { status, body });
                    }
                    warn!(attempt = attempts, status, backoff_ms = backoff.as_millis() as u64, "Server error, retrying");
                    backoff = sleep_backoff(backoff).await;
                }
            }
        }
    }

    /// Sleep until the minimum interval since the last request start has passed
    async fn throttle(&self) {
        let wait = {
            let last = self
                .last_request_start
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            last.map(|start| self.policy.min_interval.saturating_sub(start.elapsed()))
        };

        if let Some(wait) = wait
            && !wait.is_zero()
        {
            tokio::time::sleep(wait).await;
        }

        *self
            .last_request_start
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Instant::now());
    }
}

/// Parse the text of a server reply into a JSON object
fn reply_to_object(reply: &Value) -> Map<String, Value> {
    let content = extract_message_content(reply);
    if content.trim().is_empty() {
        return Map::new();
    }
    parse_json(&content)
}

/// Sleep for `backoff` plus jitter and return the next backoff
async fn sleep_backoff(backoff: Duration) -> Duration {
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..MAX_JITTER_MS));
    tokio::time::sleep(backoff + jitter).await;
    next_backoff(backoff)
}

/// Geometric backoff growth
pub fn next_backoff(backoff: Duration) -> Duration {
    backoff.mul_f64(BACKOFF_GROWTH)
}

#[async_trait]
impl<T: Transport> CompletionService for CompletionClient<T> {
    async fn generate(
        &self,
        system_prompt: &str,
        user_text: &str,
        params: &ModelParams,
    ) -> Result<Map<String, Value>> {
        CompletionClient::<T>::generate(self, system_prompt, user_text, params).await
    }
}
