/**
 * Backend Error Types
 *
 * This module defines error types specific to the edge server.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Types
 *
 * - `HandlerError` - Errors that occur in HTTP handlers
 * - `WorkerError` - Cache worker lifecycle failures (install, bad routes)
 * - `UpstreamError` - The storefront origin could not be reached
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Handler errors occur when processing HTTP requests:
 * - Unreadable request bodies
 * - Malformed control messages
 *
 * ## Upstream Errors
 *
 * Upstream errors are transport failures only. An origin answering with an
 * error status is not an error here; the response is passed through.
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::shared::{ConfigError, SharedError};

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use luxemarket::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// let err = BackendError::upstream("connection refused");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., unreadable body, invalid message)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Cache worker error
    #[error("Worker error: {message}")]
    WorkerError {
        /// Human-readable error message
        message: String,
    },

    /// Transport failure talking to the origin
    #[error("Upstream error: {message}")]
    UpstreamError {
        /// Human-readable error message
        message: String,
    },

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Server configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a new worker error
    pub fn worker(message: impl Into<String>) -> Self {
        Self::WorkerError {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamError {
            message: message.into(),
        }
    }

    /// Whether this is a transport failure reaching the origin
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamError { .. })
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `WorkerError` - 500 Internal Server Error
    /// - `UpstreamError` - 502 Bad Gateway
    /// - `SharedError` - Depends on the shared error type
    /// - `ConfigError` / `SerializationError` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::WorkerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::SerializationError { .. } | SharedError::StorageError { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::ConfigError(_) | Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::WorkerError { message } => message.clone(),
            Self::UpstreamError { message } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::ConfigError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error() {
        let error = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
        match error {
            BackendError::HandlerError { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "Invalid request");
            }
            _ => panic!("Expected HandlerError"),
        }
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            BackendError::handler(StatusCode::UNPROCESSABLE_ENTITY, "bad").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(BackendError::worker("install").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(BackendError::upstream("refused").status_code(), StatusCode::BAD_GATEWAY);

        let validation: BackendError = SharedError::validation("type", "missing").into();
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_is_upstream() {
        assert!(BackendError::upstream("reset").is_upstream());
        assert!(!BackendError::worker("reset").is_upstream());
    }

    #[test]
    fn test_error_message() {
        let error = BackendError::upstream("connection refused");
        assert_eq!(error.message(), "connection refused");
        assert!(error.to_string().contains("Upstream error"));
    }
}
