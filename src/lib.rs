//! Single-session chat with a hosted LLM.
//!
//! A [`Session`] owns an append-only [`ConversationStore`]; each submission
//! runs one [`TurnProcessor`] step against a [`CompletionService`].

pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod secrets;
pub mod session;
pub mod streaming;
pub mod trace;
pub mod turn;
pub mod ui;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use conversation::{ConversationStore, Role, Turn};
pub use error::{FailureReason, RemoteCallFailure, SecretsError};
pub use llm::{CompletionService, LlmClient, LoggingService};
pub use secrets::Secrets;
pub use session::Session;
pub use turn::TurnProcessor;

use anyhow::Result;
use std::sync::Arc;
use trace::RunTracer;

/// Wire the HTTP client, logging wrapper and optional tracer into a fresh session
pub fn build_session(config: &Config, secrets: &Secrets) -> Result<Session> {
    let client: Arc<dyn CompletionService> = Arc::new(LlmClient::new(config, secrets)?);
    let service = Arc::new(LoggingService::new(client));
    let tracer = RunTracer::from_config(config, secrets)?;

    Ok(Session::new(TurnProcessor::new(service).with_tracer(tracer)))
}
