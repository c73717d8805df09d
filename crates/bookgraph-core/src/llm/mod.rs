//! LLM integration - local completion server
//!
//! This module provides:
//! - A rate-limited, retrying HTTP client for `/api/chat`
//! - Request types and generation parameters
//! - Best-effort JSON recovery from free-form replies
//! - The [`CompletionService`] seam the classifier and extractor depend on

mod client;
pub mod json;
mod transport;
mod types;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

pub use client::{
    BACKOFF_GROWTH, CompletionClient, CompletionClientBuilder, DEFAULT_HOST, DEFAULT_MODEL,
    MAX_JITTER_MS, RetryPolicy, next_backoff,
};
pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{
    ADVANCED_OPTION_WHITELIST, ChatRequest, Message, MessageRole, ModelParams, RESPONSE_FORMAT,
    THINK_CLOSE, THINK_OPEN,
};

/// Anything that can answer a system/user prompt pair with a JSON object
///
/// Implementations return an empty object when the reply carries no usable
/// JSON, and an error only when the exchange itself failed.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Ask for a completion and parse it into a JSON object
    async fn generate(
        &self,
        system_prompt: &str,
        user_text: &str,
        params: &ModelParams,
    ) -> Result<Map<String, Value>>;
}
