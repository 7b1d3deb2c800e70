use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with a snapshot store.
#[derive(Debug, Error)]
pub enum SnapshotStoreError {
    /// The stored version did not match the version the writer expected.
    #[error("Concurrency conflict: expected version {expected}, found {actual}")]
    ConcurrencyConflict { expected: Version, actual: Version },

    /// The snapshot being saved does not follow the expected version.
    #[error("Snapshot version {actual} does not follow stored version {stored}")]
    NonSequentialVersion { stored: Version, actual: Version },

    /// The backing storage refused the write.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A filesystem error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for snapshot store operations.
pub type Result<T> = std::result::Result<T, SnapshotStoreError>;
