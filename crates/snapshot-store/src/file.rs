use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    Result, Snapshot, Version,
    store::{SaveOptions, SnapshotStore, check_expected_version, record_load, record_save},
};

/// Snapshot store backed by a single pretty-printed JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write never leaves a truncated snapshot behind.
#[derive(Debug)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSnapshotStore {
    /// Creates a store that reads and writes `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read(&self) -> Result<Option<Snapshot>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version> {
        let _guard = self.write_lock.lock().await;

        let stored = self
            .read()
            .await?
            .map(|s| s.version)
            .unwrap_or_default();
        check_expected_version(stored, &snapshot, &options)?;

        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!("snapshot written");
        Ok(snapshot.version)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileSnapshotStore {
    #[tracing::instrument(skip(self, snapshot), fields(path = %self.path.display(), version = %snapshot.version))]
    async fn save_snapshot(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version> {
        let started = Instant::now();
        let result = self.write(snapshot, options).await;
        record_save("file", started, &result);
        result
    }

    async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        let started = Instant::now();
        let result = self.read().await;
        record_load("file", started, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnapshotStoreError;

    fn snapshot_at(version: Version) -> Snapshot {
        Snapshot::new(version, serde_json::json!({"menu": []}))
    }

    #[tokio::test]
    async fn missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("restaurant.json"));
        assert!(store.load_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_writes_file_and_load_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restaurant.json");
        let store = JsonFileSnapshotStore::new(&path);
        assert_eq!(store.path(), path.as_path());

        store
            .save_snapshot(snapshot_at(Version::first()), SaveOptions::expect_new())
            .await
            .unwrap();

        assert!(path.exists());
        assert!(!store.temp_path().exists());

        let reopened = JsonFileSnapshotStore::new(&path);
        let loaded = reopened.load_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded.version, Version::first());
        assert_eq!(loaded.state, serde_json::json!({"menu": []}));
    }

    #[tokio::test]
    async fn stale_writer_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("restaurant.json"));

        store
            .save_snapshot(snapshot_at(Version::first()), SaveOptions::expect_new())
            .await
            .unwrap();
        let result = store
            .save_snapshot(snapshot_at(Version::new(2)), SaveOptions::expect_new())
            .await;

        assert!(matches!(
            result,
            Err(SnapshotStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restaurant.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = JsonFileSnapshotStore::new(&path);
        let result = store.load_snapshot().await;
        assert!(matches!(result, Err(SnapshotStoreError::Serialization(_))));
    }
}
