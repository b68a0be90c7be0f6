//! Engine client error types

use bytes::Bytes;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine client errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine could not be reached, or did not answer in time
    #[error("Engine unavailable: {reason}")]
    Unavailable {
        reason: String,
        timed_out: bool,
    },

    /// The engine answered with a non-2xx status
    #[error("Engine rejected request with HTTP {status}")]
    Rejected {
        status: u16,
        body: Bytes,
        content_type: Option<String>,
    },

    /// The engine answered 2xx with a body that is not JSON
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Map a transport-level failure
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        Self::Unavailable {
            timed_out: err.is_timeout(),
            reason: err.to_string(),
        }
    }

    /// Whether the call may succeed if the client tries again later.
    /// Only safe to act on for idempotent operations.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Check if the call ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Unavailable { timed_out: true, .. })
    }

    /// Engine status code for rejections
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Rejection body decoded as JSON, if it is JSON
    pub fn rejection_json(&self) -> Option<serde_json::Value> {
        match self {
            Self::Rejected { body, .. } => serde_json::from_slice(body).ok(),
            _ => None,
        }
    }
}
