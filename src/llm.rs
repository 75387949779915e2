//! Completion service abstraction and the HTTP client behind it.

use crate::config::Config;
use crate::conversation::{Role, Turn};
use crate::error::RemoteCallFailure;
use crate::secrets::Secrets;
use crate::streaming::SseAccumulator;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Maps an ordered history to one assistant reply
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, history: &[Turn]) -> Result<String, RemoteCallFailure>;

    fn model_id(&self) -> &str;
}

/// Message in conversation, as sent on the wire
#[derive(Debug, Clone, Serialize)]
pub struct LlmMessage<'a> {
    pub role: Role,
    pub content: &'a str,
}

impl<'a> From<&'a Turn> for LlmMessage<'a> {
    fn from(turn: &'a Turn) -> Self {
        Self {
            role: turn.role(),
            content: turn.text(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<LlmMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    stream: bool,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl LlmClient {
    /// Build a client. No request timeout is set; a turn waits for the reply.
    pub fn new(config: &Config, secrets: &Secrets) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("groqchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_http_client(client, config, secrets))
    }

    pub fn with_http_client(client: reqwest::Client, config: &Config, secrets: &Secrets) -> Self {
        Self {
            client,
            url: config.completions_url(),
            model: config.model.clone(),
            api_key: secrets.chatbot_api_key().to_string(),
            stream: config.stream,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    async fn read_streamed(response: reqwest::Response) -> Result<String, RemoteCallFailure> {
        let mut stream = response.bytes_stream();
        let mut accumulator = SseAccumulator::new();

        while let Some(chunk) = stream.next().await {
            accumulator.push_chunk(&chunk?)?;
            if accumulator.is_done() {
                break;
            }
        }

        accumulator.finish()
    }

    async fn read_whole(response: reqwest::Response) -> Result<String, RemoteCallFailure> {
        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| RemoteCallFailure::malformed(format!("invalid completion body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RemoteCallFailure::malformed("completion contained no message"))
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, history: &[Turn]) -> Result<String, RemoteCallFailure> {
        let payload = ChatRequest {
            model: &self.model,
            messages: history.iter().map(LlmMessage::from).collect(),
            stream: self.stream,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RemoteCallFailure::from_status(status.as_u16(), &error_text));
        }

        if self.stream {
            Self::read_streamed(response).await
        } else {
            Self::read_whole(response).await
        }
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn CompletionService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn CompletionService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl CompletionService for LoggingService {
    async fn complete(&self, history: &[Turn]) -> Result<String, RemoteCallFailure> {
        let start = Instant::now();
        let result = self.inner.complete(history).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    turns = history.len(),
                    reply_len = reply.len(),
                    "completion succeeded"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    turns = history.len(),
                    reason = %e.reason,
                    error = %e.message,
                    "completion failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
