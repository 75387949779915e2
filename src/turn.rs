use crate::conversation::{ConversationStore, Turn};
use crate::error::RemoteCallFailure;
use crate::llm::CompletionService;
use crate::trace::{RunRecord, RunTracer};
use chrono::Utc;
use std::sync::Arc;

/// Runs one user turn against the completion service.
///
/// A single request and a single reply: no retry, no timeout on the
/// completion call, no partial results. Run export is bounded by the
/// tracer's own timeout.
#[derive(Clone)]
pub struct TurnProcessor {
    service: Arc<dyn CompletionService>,
    tracer: Option<RunTracer>,
}

impl TurnProcessor {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: Option<RunTracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn model_id(&self) -> &str {
        self.service.model_id()
    }

    /// Record the user's text, send the whole history, and append the reply.
    ///
    /// On failure the user turn stays in the store and nothing else is added.
    pub async fn run(
        &self,
        store: &mut ConversationStore,
        user_text: impl Into<String>,
    ) -> Result<Turn, RemoteCallFailure> {
        store.append(Turn::user(user_text));

        let started = Utc::now();
        let outcome = self.service.complete(store.all()).await;
        let run = self
            .tracer
            .as_ref()
            .map(|tracer| RunRecord::new(tracer.project(), store.all(), started, &outcome));

        let result = outcome.map(|text| {
            let reply = Turn::assistant(text);
            store.append(reply.clone());
            reply
        });

        // Reply is already in the store when export runs
        if let (Some(tracer), Some(run)) = (&self.tracer, run) {
            tracer.record(&run).await;
        }

        result
    }
}
