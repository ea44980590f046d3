//! Error types for Hermes.
//!
//! Hermes separates two kinds of failure:
//!
//! - **Domain errors**: the backend answered with a non-2xx status. These are
//!   values stored on the context as `Err(ApiFailure)` and never travel the
//!   `?` path. See [`ApiFailure`](crate::ApiFailure).
//! - **Exceptions**: anything that prevents the chain from producing a result
//!   (network failure, cancellation, a store reset while in flight, a body that
//!   is not JSON). These are [`HermesError`] values and end up at the error
//!   boundary stage, which either drops them as benign or reports them.

use thiserror::Error;

/// Result type alias using [`HermesError`].
pub type HermesResult<T> = Result<T, HermesError>;

/// Message patterns that identify errors which are expected during normal
/// operation and must never be reported.
///
/// Matching is a case-sensitive substring test against the rendered error.
pub const BENIGN_PATTERNS: &[&str] = &[
    "Failed to fetch",
    "NetworkError when attempting to fetch resource",
    "Load failed",
    "The operation was aborted",
    "The user aborted a request",
    "store reset",
];

/// Returns true if `message` matches one of the [`BENIGN_PATTERNS`].
///
/// # Example
///
/// ```
/// use hermes_core::HermesError;
///
/// assert!(hermes_core::is_benign_message("The operation was aborted"));
/// assert!(!hermes_core::is_benign_message("unexpected end of input"));
/// assert!(HermesError::Aborted.is_benign());
/// ```
#[must_use]
pub fn is_benign_message(message: &str) -> bool {
    BENIGN_PATTERNS.iter().any(|pattern| message.contains(pattern))
}

/// Exception-path error raised inside a middleware chain.
#[derive(Error, Debug)]
pub enum HermesError {
    /// The transport could not complete the exchange.
    #[error("{message}")]
    Transport {
        /// Human-readable error message.
        message: String,
        /// The URL that was being fetched.
        url: Option<String>,
    },

    /// The call was cancelled through the abort signal.
    #[error("The operation was aborted")]
    Aborted,

    /// The store was reset while the call was in flight.
    #[error("store reset while request was in flight")]
    StoreReset,

    /// The response body could not be decoded.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be built (bad URL, missing path parameter, ...).
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Human-readable error message.
        message: String,
    },

    /// Configuration prevented the call.
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
    },

    /// Anything else.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl HermesError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            url: None,
        }
    }

    /// Creates a transport error tied to a URL.
    #[must_use]
    pub fn transport_for(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            url: Some(url.into()),
        }
    }

    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error is expected noise rather than a defect.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        match self {
            Self::Aborted | Self::StoreReset => true,
            other => is_benign_message(&other.to_string()),
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Aborted => "ABORTED",
            Self::StoreReset => "STORE_RESET",
            Self::Decode(_) => "DECODE_ERROR",
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_message() {
        assert_eq!(HermesError::Aborted.to_string(), "The operation was aborted");
        assert!(HermesError::Aborted.is_benign());
    }

    #[test]
    fn test_transport_failures_matching_browser_messages_are_benign() {
        assert!(HermesError::transport("TypeError: Failed to fetch").is_benign());
        assert!(HermesError::transport("Load failed").is_benign());
        assert!(
            HermesError::transport("NetworkError when attempting to fetch resource.").is_benign()
        );
    }

    #[test]
    fn test_unexpected_errors_are_not_benign() {
        assert!(!HermesError::transport("connection refused").is_benign());
        assert!(!HermesError::internal("boom").is_benign());
        assert!(!HermesError::invalid_request("missing :id").is_benign());
    }

    #[test]
    fn test_store_reset_is_benign() {
        assert!(HermesError::StoreReset.is_benign());
        assert!(is_benign_message(&HermesError::StoreReset.to_string()));
    }

    #[test]
    fn test_decode_error_from_serde() {
        let err: HermesError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "DECODE_ERROR");
        assert!(!err.is_benign());
    }

    #[test]
    fn test_transport_for_keeps_url() {
        match HermesError::transport_for("timed out", "https://api.test/apps") {
            HermesError::Transport { url, .. } => {
                assert_eq!(url.as_deref(), Some("https://api.test/apps"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
