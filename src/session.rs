use crate::conversation::{ConversationStore, Turn};
use crate::error::RemoteCallFailure;
use crate::turn::TurnProcessor;
use uuid::Uuid;

/// One user's chat lifetime: owns the history and the processor that extends it.
///
/// Nothing is shared across sessions and nothing outlives the session.
pub struct Session {
    session_id: Uuid,
    store: ConversationStore,
    processor: TurnProcessor,
}

impl Session {
    pub fn new(processor: TurnProcessor) -> Self {
        let session_id = Uuid::new_v4();
        tracing::info!(session_id = %session_id, model = %processor.model_id(), "session started");

        Self {
            session_id,
            store: ConversationStore::new(),
            processor,
        }
    }

    /// Submit one message and wait for the reply
    pub async fn submit(&mut self, text: impl Into<String>) -> Result<Turn, RemoteCallFailure> {
        let text = text.into();
        tracing::debug!(
            session_id = %self.session_id,
            turn = self.store.len(),
            text_len = text.len(),
            "submitting turn"
        );

        let result = self.processor.run(&mut self.store, text).await;
        if let Err(e) = &result {
            tracing::warn!(session_id = %self.session_id, reason = %e.reason, "turn failed");
        }
        result
    }

    pub fn history(&self) -> &ConversationStore {
        &self.store
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn model_id(&self) -> &str {
        self.processor.model_id()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::info!(session_id = %self.session_id, turns = self.store.len(), "session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::testing::StubService;
    use std::sync::Arc;

    fn session_with(stub: Arc<StubService>) -> Session {
        Session::new(TurnProcessor::new(stub))
    }

    #[tokio::test]
    async fn n_successful_submissions_give_2n_alternating_turns() {
        let inputs = ["one", "two", "three", "four"];
        let stub = Arc::new(StubService::replying(&["r1", "r2", "r3", "r4"]));
        let mut session = session_with(stub);

        for input in inputs {
            session.submit(input).await.expect("turn failed");
        }

        let turns = session.history().all();
        assert_eq!(turns.len(), 2 * inputs.len());
        for (i, pair) in turns.chunks(2).enumerate() {
            assert_eq!(pair[0], Turn::user(inputs[i]));
            assert_eq!(pair[1].role(), Role::Assistant);
            assert_eq!(pair[1].text(), format!("r{}", i + 1));
        }
    }

    #[tokio::test]
    async fn earlier_turns_survive_later_appends_unchanged() {
        let stub = Arc::new(StubService::replying(&["a1", "a2"]));
        let mut session = session_with(stub);

        session.submit("q1").await.unwrap();
        let before = session.history().all().to_vec();
        session.submit("q2").await.unwrap();

        assert_eq!(&session.history().all()[..before.len()], before.as_slice());
    }

    #[tokio::test]
    async fn failed_turn_then_recovery() {
        let stub = Arc::new(StubService::new());
        stub.queue_reply("a1");
        stub.queue_failure(RemoteCallFailure::network("connection reset"));
        stub.queue_reply("a3");
        let mut session = session_with(stub.clone());

        session.submit("q1").await.unwrap();
        let err = session.submit("q2").await.unwrap_err();
        assert_eq!(err.message, "connection reset");
        assert_eq!(
            session.history().all(),
            &[Turn::user("q1"), Turn::assistant("a1"), Turn::user("q2")]
        );

        session.submit("q3").await.unwrap();

        let expected_prior = vec![
            Turn::user("q1"),
            Turn::assistant("a1"),
            Turn::user("q2"),
            Turn::user("q3"),
        ];
        assert_eq!(stub.recorded_requests()[2], expected_prior);
        assert_eq!(session.history().last(), Some(&Turn::assistant("a3")));
        assert_eq!(session.history().len(), 5);
    }

    #[tokio::test]
    async fn sessions_do_not_share_history() {
        let mut first = session_with(Arc::new(StubService::replying(&["x"])));
        let second = session_with(Arc::new(StubService::new()));

        first.submit("hello").await.unwrap();

        assert_eq!(first.history().len(), 2);
        assert!(second.history().is_empty());
        assert_ne!(first.session_id(), second.session_id());
    }
}
