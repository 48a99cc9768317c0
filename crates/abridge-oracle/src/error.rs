//! Error types for oracle operations.

use std::fmt;

/// Result type alias for oracle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during oracle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Provider error (API call failed, rate limited, timed out).
    #[error("provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The oracle returned an empty response.
    #[error("empty response")]
    EmptyResponse,

    /// The oracle returned a payload that does not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// JSON decoding of the response payload failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a provider error.
    pub fn provider(provider: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl fmt::Display) -> Self {
        Self::InvalidResponse(message.to_string())
    }

    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Returns true if this error is retryable.
    ///
    /// Malformed and empty payloads count as retryable: they are usually
    /// transient model noise, not a fixed property of the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. }
                | Self::EmptyResponse
                | Self::InvalidResponse(_)
                | Self::Serialization(_)
        )
    }
}
