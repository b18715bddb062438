use thiserror::Error;

/// Errors that can occur when interacting with a snapshot store.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot state could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for snapshot store operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;
