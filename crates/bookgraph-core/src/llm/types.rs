//! LLM types for the Ollama-style chat API
//!
//! These types match the `/api/chat` request format: a model name, a list of
//! role-tagged messages, a response format hint and an `options` object with
//! sampling parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response format requested from the server
pub const RESPONSE_FORMAT: &str = "json";

/// Opening marker of a model's internal reasoning block
pub const THINK_OPEN: &str = "<think>";

/// Closing marker of a model's internal reasoning block
pub const THINK_CLOSE: &str = "</think>";

/// Advanced sampling options forwarded to the server; anything else is dropped
pub const ADVANCED_OPTION_WHITELIST: &[&str] = &[
    "top_p",
    "top_k",
    "repeat_penalty",
    "presence_penalty",
    "frequency_penalty",
    "seed",
    "mirostat",
    "mirostat_eta",
    "mirostat_tau",
];

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions/context)
    System,
    /// User message (the concept or section being asked about)
    User,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new message
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// Generation parameters for a single completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Token budget (`num_predict`)
    pub num_tokens: u32,
    /// Sampling temperature
    pub temperature: f64,
    /// User supplied stop sequences
    pub stop: Vec<String>,
    /// Ask the server to stream the reply
    pub stream: bool,
    /// How long the server keeps the model loaded
    pub keep_alive: String,
    /// When false, reasoning markers are added to the stop list
    pub allow_thinking: bool,
    /// Passthrough sampling options, filtered through [`ADVANCED_OPTION_WHITELIST`]
    pub advanced: BTreeMap<String, Value>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            num_tokens: 400,
            temperature: 0.0,
            stop: Vec::new(),
            stream: false,
            keep_alive: "10m".to_string(),
            allow_thinking: false,
            advanced: BTreeMap::new(),
        }
    }
}

impl ModelParams {
    /// Set the token budget
    pub fn with_num_tokens(mut self, num_tokens: u32) -> Self {
        self.num_tokens = num_tokens;
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Allow or suppress reasoning output
    pub fn with_thinking(mut self, allow: bool) -> Self {
        self.allow_thinking = allow;
        self
    }

    /// Add an advanced sampling option
    pub fn with_advanced(mut self, key: impl Into<String>, value: Value) -> Self {
        self.advanced.insert(key.into(), value);
        self
    }

    /// Stop sequences sent to the server
    pub fn build_stop_list(&self) -> Vec<String> {
        let mut stops = self.stop.clone();
        if !self.allow_thinking {
            for marker in [THINK_OPEN, THINK_CLOSE] {
                if !stops.iter().any(|s| s == marker) {
                    stops.push(marker.to_string());
                }
            }
        }
        stops
    }

    /// The `options` object of a chat request
    pub fn build_options(&self) -> Map<String, Value> {
        let mut options = Map::new();
        options.insert("temperature".into(), Value::from(self.temperature));
        options.insert("num_predict".into(), Value::from(self.num_tokens));
        options.insert("stop".into(), Value::from(self.build_stop_list()));

        for (key, value) in &self.advanced {
            if value.is_null() || !ADVANCED_OPTION_WHITELIST.contains(&key.as_str()) {
                continue;
            }
            options.insert(key.clone(), value.clone());
        }
        options
    }
}

/// Request body for `/api/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "deepseek-r1:32b")
    pub model: String,
    /// System and user messages
    pub messages: Vec<Message>,
    /// Enable streaming responses
    pub stream: bool,
    /// Response format hint
    pub format: &'static str,
    /// Keep-alive duration for the loaded model
    pub keep_alive: String,
    /// Sampling options
    pub options: Map<String, Value>,
}

impl ChatRequest {
    /// Build a chat request from prompts and generation parameters
    pub fn new(
        model: impl Into<String>,
        system_prompt: &str,
        user_text: &str,
        params: &ModelParams,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::system(system_prompt), Message::user(user_text)],
            stream: params.stream,
            format: RESPONSE_FORMAT,
            keep_alive: params.keep_alive.clone(),
            options: params.build_options(),
        }
    }
}
