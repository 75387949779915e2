//! Stub completion service for tests

use crate::conversation::Turn;
use crate::error::RemoteCallFailure;
use crate::llm::CompletionService;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Returns queued replies in order and records every history it was sent
pub struct StubService {
    replies: Mutex<VecDeque<Result<String, RemoteCallFailure>>>,
    pub requests: Mutex<Vec<Vec<Turn>>>,
}

impl StubService {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        let stub = Self::new();
        for reply in replies {
            stub.queue_reply(*reply);
        }
        stub
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn queue_failure(&self, failure: RemoteCallFailure) {
        self.replies.lock().unwrap().push_back(Err(failure));
    }

    pub fn recorded_requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for StubService {
    async fn complete(&self, history: &[Turn]) -> Result<String, RemoteCallFailure> {
        self.requests.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteCallFailure::network("no stub reply queued")))
    }

    fn model_id(&self) -> &str {
        "stub-model"
    }
}
