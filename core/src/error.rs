//! Error types for the call sequencer and its transports.
//!
//! # Design
//! Status-level failures keep the status code and the resolved URL so the
//! caller can tell which of the sequenced calls failed. Everything below the
//! status line (refused connections, broken body streams) is a `Transport`
//! failure, whether it was detected at send time or while reading the body.

use thiserror::Error;

/// Failures surfaced by `CallSequencer::run` and by response body reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// The server answered with a 4xx status.
    #[error("HTTP {status} returned for \"{url}\"")]
    Client { status: u16, url: String },

    /// The server answered with a 5xx status.
    #[error("HTTP {status} returned for \"{url}\"")]
    Server { status: u16, url: String },

    /// The server answered with a 3xx status the transport did not follow.
    #[error("redirection {status} not followed for \"{url}\"")]
    Redirection { status: u16, url: String },

    /// The exchange failed below the status level.
    #[error("transport failure for \"{url}\": {message}")]
    Transport { url: String, message: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl HttpError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        HttpError::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Status code carried by status-level failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Client { status, .. }
            | HttpError::Server { status, .. }
            | HttpError::Redirection { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::Transport { .. })
    }
}
