//! Conversation UI components for the chat screen

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;

pub use commands::{get_help_text, parse_slash_command, ParsedCommand, SlashCommand};
pub use composer::{ComposerResult, ConversationComposer};
pub use history::HistoryView;
pub use manager::{ConversationAction, ConversationManager};
