use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Result, Snapshot, SnapshotStoreError, Version,
    store::{SaveOptions, SnapshotStore, check_expected_version, record_load, record_save},
};

#[derive(Debug, Default)]
struct InMemoryState {
    latest: Option<Snapshot>,
    save_count: usize,
    fail_on_save: bool,
}

/// In-memory snapshot store for testing and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemorySnapshotStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to reject every save until reset.
    pub async fn set_fail_on_save(&self, fail: bool) {
        self.state.write().await.fail_on_save = fail;
    }

    /// Returns the number of successful saves.
    pub async fn save_count(&self) -> usize {
        self.state.read().await.save_count
    }

    /// Returns the currently stored version.
    pub async fn current_version(&self) -> Version {
        self.state
            .read()
            .await
            .latest
            .as_ref()
            .map(|s| s.version)
            .unwrap_or_default()
    }

    async fn write(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version> {
        let mut state = self.state.write().await;

        if state.fail_on_save {
            return Err(SnapshotStoreError::Unavailable(
                "in-memory store configured to fail".to_string(),
            ));
        }

        let stored = state
            .latest
            .as_ref()
            .map(|s| s.version)
            .unwrap_or_default();
        check_expected_version(stored, &snapshot, &options)?;

        let version = snapshot.version;
        state.latest = Some(snapshot);
        state.save_count += 1;
        Ok(version)
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save_snapshot(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version> {
        let started = Instant::now();
        let result = self.write(snapshot, options).await;
        record_save("memory", started, &result);
        result
    }

    async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        let started = Instant::now();
        let result = Ok(self.state.read().await.latest.clone());
        record_load("memory", started, &result);
        result
    }
}
