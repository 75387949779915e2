//! Optional export of one run record per turn to a LangSmith-style endpoint.

use crate::config::Config;
use crate::conversation::Turn;
use crate::error::RemoteCallFailure;
use crate::llm::LlmMessage;
use crate::secrets::Secrets;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use uuid::Uuid;

/// Upper bound on one export request, connect included
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// One traced completion call
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub name: &'static str,
    pub run_type: &'static str,
    pub inputs: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub session_name: String,
}

impl RunRecord {
    pub fn new(
        project: &str,
        history: &[Turn],
        start_time: DateTime<Utc>,
        outcome: &Result<String, RemoteCallFailure>,
    ) -> Self {
        let messages: Vec<LlmMessage<'_>> = history.iter().map(LlmMessage::from).collect();
        let (outputs, error) = match outcome {
            Ok(reply) => (
                Some(json!({ "messages": [{ "role": "assistant", "content": reply }] })),
                None,
            ),
            Err(failure) => (None, Some(format!("{}: {}", failure.reason, failure.message))),
        };

        Self {
            id: Uuid::new_v4(),
            name: "chatbot",
            run_type: "llm",
            inputs: json!({ "messages": messages }),
            outputs,
            error,
            start_time,
            end_time: Utc::now(),
            session_name: project.to_string(),
        }
    }
}

/// Posts run records; failures are logged and otherwise ignored
#[derive(Clone)]
pub struct RunTracer {
    client: reqwest::Client,
    url: String,
    api_key: String,
    project: String,
    timeout: Duration,
}

impl RunTracer {
    /// Returns `None` unless tracing is enabled and a tracing key is present
    pub fn from_config(config: &Config, secrets: &Secrets) -> Result<Option<Self>> {
        if !config.tracing.enabled {
            return Ok(None);
        }
        let Some(api_key) = secrets.tracing_api_key() else {
            tracing::warn!("run tracing enabled but no langsmith_api_key found; tracing disabled");
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_EXPORT_TIMEOUT)
            .build()
            .context("Failed to create tracing HTTP client")?;

        Ok(Some(Self::with_http_client(
            client,
            &config.tracing.endpoint,
            api_key,
            &config.tracing.project,
        )))
    }

    pub fn with_http_client(
        client: reqwest::Client,
        endpoint: &str,
        api_key: &str,
        project: &str,
    ) -> Self {
        Self {
            client,
            url: format!("{}/runs", endpoint.trim_end_matches('/')),
            api_key: api_key.to_string(),
            project: project.to_string(),
            timeout: DEFAULT_EXPORT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub async fn record(&self, run: &RunRecord) {
        let result = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(run)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => tracing::debug!(run_id = %run.id, "run exported"),
            Err(e) => tracing::warn!(run_id = %run.id, error = %e, "run export failed"),
        }
    }
}
