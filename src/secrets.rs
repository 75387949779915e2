//! API keys loaded once at startup from a dotenv-style key file.

use crate::error::SecretsError;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const CHATBOT_KEY: &str = "chatbot_api_key";
pub const TRACING_KEY: &str = "langsmith_api_key";

/// Keys needed by the completion client and the run tracer
#[derive(Clone)]
pub struct Secrets {
    chatbot_api_key: String,
    tracing_api_key: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("chatbot_api_key", &"<redacted>")
            .field(
                "tracing_api_key",
                &self.tracing_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Secrets {
    pub fn new(chatbot_api_key: impl Into<String>, tracing_api_key: Option<String>) -> Self {
        Self {
            chatbot_api_key: chatbot_api_key.into(),
            tracing_api_key,
        }
    }

    /// Load from the key file, falling back to upper-cased environment variables.
    ///
    /// Fails if the chatbot key is found in neither place.
    pub fn load(path: &Path) -> Result<Self, SecretsError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    pub fn load_with(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SecretsError> {
        let file = match fs::read_to_string(path) {
            Ok(content) => parse_key_file(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "key file not found, using environment only");
                HashMap::new()
            }
            Err(source) => {
                return Err(SecretsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let present = |value: &String| !value.trim().is_empty();
        let lookup = |name: &str| {
            file.get(name)
                .filter(|value| present(value))
                .cloned()
                .or_else(|| env(&name.to_uppercase()).filter(present))
        };

        let chatbot_api_key = lookup(CHATBOT_KEY).ok_or_else(|| SecretsError::MissingKey {
            name: CHATBOT_KEY,
            path: PathBuf::from(path),
        })?;

        Ok(Self {
            chatbot_api_key,
            tracing_api_key: lookup(TRACING_KEY),
        })
    }

    pub fn chatbot_api_key(&self) -> &str {
        &self.chatbot_api_key
    }

    pub fn tracing_api_key(&self) -> Option<&str> {
        self.tracing_api_key.as_deref()
    }
}

/// Parse `KEY=VALUE` lines. Comments, blank lines, `export ` prefixes and
/// matching outer quotes are handled; anything else without `=` is skipped.
pub fn parse_key_file(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        values.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    values
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    // Unquoted values may carry a trailing comment
    match value.find(" #") {
        Some(pos) => value[..pos].trim_end(),
        None => value,
    }
}
