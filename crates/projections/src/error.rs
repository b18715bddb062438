//! Projection error types.

use thiserror::Error;

/// Errors that can occur while maintaining read models.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// No projection is registered under this name.
    #[error("Projection not registered: {0}")]
    NotRegistered(String),

    /// An event could not be constructed (missing required field).
    #[error("Invalid event: missing {0}")]
    InvalidEvent(&'static str),

    /// Failed to deserialize an event payload.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The backing read model store failed.
    #[error("Read model store error: {0}")]
    Store(String),

    /// A projection-specific error.
    #[error("Projection error: {0}")]
    Projection(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
