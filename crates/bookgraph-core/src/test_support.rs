//! In-memory stand-ins for the completion server

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::llm::{CompletionService, ModelParams, Transport, TransportError};

/// One recorded `generate` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub system: String,
    pub user: String,
}

/// Completion service answering through a closure and logging every call
pub struct ScriptedService<F> {
    respond: F,
    calls: Mutex<Vec<Call>>,
}

impl<F> ScriptedService<F>
where
    F: Fn(&str, &str) -> Result<Value> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> CompletionService for ScriptedService<F>
where
    F: Fn(&str, &str) -> Result<Value> + Send + Sync,
{
    async fn generate(
        &self,
        system_prompt: &str,
        user_text: &str,
        _params: &ModelParams,
    ) -> Result<Map<String, Value>> {
        self.calls.lock().unwrap().push(Call {
            system: system_prompt.to_string(),
            user: user_text.to_string(),
        });
        match (self.respond)(system_prompt, user_text)? {
            Value::Object(object) => Ok(object),
            _ => Ok(Map::new()),
        }
    }
}

/// Transport replaying a fixed queue of outcomes for POST requests
///
/// GET requests answer with `tags` when set, otherwise fail to connect.
#[derive(Default)]
pub struct ScriptedTransport {
    posts: Mutex<VecDeque<std::result::Result<Value, TransportError>>>,
    tags: Option<Value>,
    sent: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub fn new<I>(posts: I) -> Self
    where
        I: IntoIterator<Item = std::result::Result<Value, TransportError>>,
    {
        Self {
            posts: Mutex::new(posts.into_iter().collect()),
            tags: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tags(mut self, tags: Value) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Payloads posted so far
    pub fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> std::result::Result<Value, TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        self.posts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("script exhausted".to_string())))
    }

    async fn get_json(&self, _url: &str, _timeout: Duration) -> std::result::Result<Value, TransportError> {
        self.tags
            .clone()
            .ok_or_else(|| TransportError::Connect("connection refused".to_string()))
    }
}
