//! Error types for the media balancing layer.

use thiserror::Error;

/// Result type for media balancing operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur in the media balancing layer.
#[derive(Debug, Error)]
pub enum MediaError {
    /// No media connection is attached to the controller.
    #[error("no media connection attached")]
    NoConnection,

    /// The sender rejected a parameter mutation.
    #[error("sender rejected parameters: {message}")]
    ParametersRejected {
        /// Host-provided rejection reason.
        message: String,
    },

    /// The balance queue no longer accepts tasks.
    #[error("balance queue is closed")]
    QueueClosed,

    /// The balance queue is at capacity.
    #[error("balance queue is full")]
    QueueFull,

    /// Internal error.
    #[error("internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl MediaError {
    /// Create a parameters-rejected error.
    pub fn parameters_rejected(message: impl Into<String>) -> Self {
        Self::ParametersRejected {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
