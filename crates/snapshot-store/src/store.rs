use std::time::Instant;

use async_trait::async_trait;

use crate::{Result, Snapshot, SnapshotStoreError, Version};

/// Options for saving a snapshot.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Version the writer believes is currently stored.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the store to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the store to be empty.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Persistence gateway for restaurant snapshots.
///
/// Implementations store the latest snapshot only. All implementations
/// must be thread-safe (Send + Sync).
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persists a snapshot, replacing the previous one.
    ///
    /// If `options.expected_version` is set, the save fails with
    /// `ConcurrencyConflict` when the stored version differs.
    ///
    /// Returns the version now stored.
    async fn save_snapshot(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version>;

    /// Loads the latest snapshot, or None if nothing was saved yet.
    async fn load_snapshot(&self) -> Result<Option<Snapshot>>;
}

/// Validates a save against the currently stored version.
pub fn check_expected_version(
    stored: Version,
    snapshot: &Snapshot,
    options: &SaveOptions,
) -> Result<()> {
    if let Some(expected) = options.expected_version
        && expected != stored
    {
        return Err(SnapshotStoreError::ConcurrencyConflict {
            expected,
            actual: stored,
        });
    }

    if snapshot.version <= stored {
        return Err(SnapshotStoreError::NonSequentialVersion {
            stored,
            actual: snapshot.version,
        });
    }

    Ok(())
}

/// Metric label for the result of a save.
pub(crate) fn save_outcome(result: &Result<Version>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(
            SnapshotStoreError::ConcurrencyConflict { .. }
            | SnapshotStoreError::NonSequentialVersion { .. },
        ) => "conflict",
        Err(_) => "error",
    }
}

/// Metric label for the result of a load.
pub(crate) fn load_outcome(result: &Result<Option<Snapshot>>) -> &'static str {
    match result {
        Ok(Some(_)) => "hit",
        Ok(None) => "miss",
        Err(_) => "error",
    }
}

pub(crate) fn record_save(backend: &'static str, started: Instant, result: &Result<Version>) {
    metrics::counter!("snapshot_saves_total", "backend" => backend, "outcome" => save_outcome(result))
        .increment(1);
    metrics::histogram!("snapshot_save_duration_seconds", "backend" => backend)
        .record(started.elapsed().as_secs_f64());
}

pub(crate) fn record_load(
    backend: &'static str,
    started: Instant,
    result: &Result<Option<Snapshot>>,
) {
    metrics::counter!("snapshot_loads_total", "backend" => backend, "outcome" => load_outcome(result))
        .increment(1);
    metrics::histogram!("snapshot_load_duration_seconds", "backend" => backend)
        .record(started.elapsed().as_secs_f64());
}
