//! End-to-end runs of the composition root against local backends.

use app::{Backend, Config};
use snapshot_store::{InMemorySnapshotStore, JsonFileSnapshotStore, SnapshotStore};

#[tokio::test]
async fn memory_run_seeds_demo_restaurant() {
    let report = app::run(&Config::default()).await.unwrap();

    assert!(report.contains("Main Course"));
    assert!(report.contains("Margherita"));
    assert!(report.contains("Guest"));
    assert!(report.contains("active orders:    2"));
}

#[tokio::test]
async fn existing_state_is_not_reseeded() {
    let store = InMemorySnapshotStore::new();
    app::run_with_store(store.clone()).await.unwrap();
    let version = store.current_version().await;

    app::run_with_store(store.clone()).await.unwrap();
    assert_eq!(store.current_version().await, version);
}

#[tokio::test]
async fn file_backend_persists_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        backend: Backend::File,
        snapshot_path: dir.path().join("restaurant.json"),
        ..Config::default()
    };

    app::run(&config).await.unwrap();
    let saved = JsonFileSnapshotStore::new(&config.snapshot_path)
        .load_snapshot()
        .await
        .unwrap()
        .unwrap();

    let report = app::run(&config).await.unwrap();
    let reloaded = JsonFileSnapshotStore::new(&config.snapshot_path)
        .load_snapshot()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(saved.version, reloaded.version);
    assert!(report.contains("Espresso"));
}
