//! Domain error types.

use snapshot_store::SnapshotStoreError;
use thiserror::Error;

use crate::restaurant::RestaurantError;

/// Errors returned by [`crate::RestaurantService`] operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The operation was rejected; no state changed.
    #[error("Restaurant error: {0}")]
    Restaurant(#[from] RestaurantError),

    /// The snapshot could not be persisted; the in-memory change was rolled back.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] SnapshotStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns the restaurant-level rejection, if this is one.
    pub fn as_restaurant(&self) -> Option<&RestaurantError> {
        match self {
            DomainError::Restaurant(e) => Some(e),
            _ => None,
        }
    }
}
