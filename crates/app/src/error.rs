//! Application error type.

use domain::DomainError;
use snapshot_store::SnapshotStoreError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Snapshot store error: {0}")]
    Store(#[from] SnapshotStoreError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Report formatting error")]
    Report(#[from] std::fmt::Error),

    #[error("Metrics recorder error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}
