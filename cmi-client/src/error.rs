//! Error types for the CMI clients

use aws_smithy_types::error::display::DisplayErrorContext;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to a remote service
#[derive(Debug, Error)]
pub enum ClientError {
    /// An AWS SDK operation failed
    #[error("{operation} failed: {message}")]
    Aws {
        /// Name of the SDK operation, e.g. "InvokeModel"
        operation: &'static str,
        /// Rendered error chain
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Wrap an AWS SDK error, keeping the full source chain in the message
    pub fn aws<E>(operation: &'static str, err: E) -> Self
    where
        E: std::error::Error,
    {
        Self::Aws {
            operation,
            message: DisplayErrorContext(&err).to_string(),
        }
    }
}
