//! Error types for turns and startup

use std::path::PathBuf;
use thiserror::Error;

/// The one way a turn can fail.
///
/// Network errors, rejected credentials and malformed replies all land here;
/// the reason is kept for logging and display but callers treat every
/// reason the same way.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteCallFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl RemoteCallFailure {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Auth, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Api, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Malformed, message)
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        match status {
            401 | 403 => Self::auth(format!("Authentication failed ({status}): {body}")),
            _ => Self::api(format!("Completion API error ({status}): {body}")),
        }
    }
}

impl From<reqwest::Error> for RemoteCallFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::malformed(error.to_string())
        } else {
            Self::network(error.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureReason {
    /// Connection refused, reset, DNS failure
    Network,
    /// 401 / 403
    Auth,
    /// Any other non-success status, or an error object in the stream
    Api,
    /// Body did not contain a usable reply
    Malformed,
}

/// Problems loading the key file
#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("required key `{name}` not found in {} or the environment", path.display())]
    MissingKey { name: &'static str, path: PathBuf },

    #[error("failed to read key file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
