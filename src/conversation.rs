use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Who sent a turn
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }
}

/// One message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Append-only chat history for a single session.
///
/// Insertion order is chronological order is display order. The store does
/// not check that roles alternate: a failed turn leaves two user turns in a
/// row and that is expected.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turn to the end. Never fails.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The full history, oldest first
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
