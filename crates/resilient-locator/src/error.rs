// Error types for resilient-locator
//
// Every variant renders a complete diagnosis from its own fields, so a failure
// can be reproduced without reading the logs.

use thiserror::Error;

/// Result type alias for resilient-locator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the resolution engine
#[derive(Debug, Error)]
pub enum Error {
    /// No candidate locator resolved within the timeout
    ///
    /// Carries the full fallback chain that was attempted, the timeout each
    /// candidate was given, and the page URL at the time of failure.
    #[error(
        "Element not found: '{primary}' (fallbacks: {fallbacks:?}) after {timeout_ms}ms on page '{page_url}'"
    )]
    ElementNotFound {
        primary: String,
        fallbacks: Vec<String>,
        timeout_ms: u64,
        page_url: String,
    },

    /// The element resolved but the requested action failed
    #[error(
        "Element '{locator}' is not interactable: {action} failed: {reason} (page: '{page_url}')"
    )]
    ElementNotInteractable {
        locator: String,
        action: String,
        reason: String,
        page_url: String,
    },

    /// A page-level or state wait exceeded its budget
    #[error("Timeout after {timeout_secs}s during {operation}: {context}")]
    Timeout {
        operation: String,
        timeout_secs: f64,
        context: String,
    },

    /// Hard verification failure
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Locator string could not be parsed
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// Invalid argument provided to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Raw failure reported by the driver adapter
    #[error("Driver error: {0}")]
    Driver(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all that keeps the original cause
    #[error("{message}")]
    Framework {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Wraps an arbitrary error, preserving it as the source
    pub fn framework<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Framework {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Builds a timeout error from a millisecond budget
    pub fn timeout(
        operation: impl Into<String>,
        timeout_ms: u64,
        context: impl Into<String>,
    ) -> Self {
        Error::Timeout {
            operation: operation.into(),
            timeout_secs: timeout_ms as f64 / 1000.0,
            context: context.into(),
        }
    }

    /// Returns true for the error classes the retry controller may retry.
    ///
    /// Context wrappers are looked through, so a contextualized
    /// `ElementNotFound` is still retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ElementNotFound { .. } | Error::ElementNotInteractable { .. } => true,
            Error::Context(_, inner) => inner.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is (or wraps) `ElementNotFound`
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::ElementNotFound { .. } => true,
            Error::Context(_, inner) => inner.is_not_found(),
            _ => false,
        }
    }
}
