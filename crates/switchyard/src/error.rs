//! Error types for routing and dispatch.

use thiserror::Error;

/// Setup-time errors raised while building a router.
///
/// These are fatal to application startup; nothing in the crate recovers
/// from them automatically.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A path pattern could not be compiled.
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern string.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A mount prefix was rejected.
    #[error("invalid mount prefix '{prefix}': {reason}")]
    InvalidMount {
        /// The offending prefix.
        prefix: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl RouterError {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mount(prefix: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMount {
            prefix: prefix.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for router setup operations.
pub type Result<T> = std::result::Result<T, RouterError>;

/// Faults raised from within a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The response was already finalized.
    #[error("response already sent")]
    AlreadySent,

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO failure while talking to a collaborator.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A free-form fault.
    #[error("{0}")]
    Message(String),

    /// Any other error raised by application code.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Creates a free-form handler fault.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Errors reported by the chain executor.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A handler returned without finalizing the response or continuing.
    #[error("handler #{index} ({handler}) neither sent a response nor continued")]
    Stalled {
        /// Position of the handler in the chain.
        index: usize,
        /// Handler name.
        handler: String,
    },

    /// A handler faulted; the rest of the chain was skipped.
    #[error("handler #{index} ({handler}) failed: {source}")]
    Handler {
        /// Position of the handler in the chain.
        index: usize,
        /// Handler name.
        handler: String,
        /// The underlying fault.
        #[source]
        source: HandlerError,
    },
}
