//! Composition root for the restaurant consistency engine.
//!
//! Wires configuration, the chosen snapshot backend and the
//! [`RestaurantService`] together, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod report;
pub mod seed;

use domain::RestaurantService;
use snapshot_store::{
    JsonFileSnapshotStore, PostgresSnapshotStore, SnapshotStore, SnapshotStoreError,
};
use sqlx::postgres::PgPoolOptions;

pub use config::{Backend, Config, ConfigError};
pub use error::AppError;

/// Loads the restaurant, seeds it when empty, and returns the text report.
pub async fn run_with_store<S: SnapshotStore>(store: S) -> Result<String, AppError> {
    let service = RestaurantService::load(store).await?;
    if seed::is_empty(&service).await {
        seed::seed_demo(&service).await?;
    }
    Ok(report::render(&service).await?)
}

/// Opens the configured backend and runs against it.
pub async fn run(config: &Config) -> Result<String, AppError> {
    match config.backend {
        Backend::Memory => {
            tracing::info!("using in-memory snapshot store");
            run_with_store(snapshot_store::InMemorySnapshotStore::new()).await
        }
        Backend::File => {
            let store = JsonFileSnapshotStore::new(&config.snapshot_path);
            tracing::info!(path = %store.path().display(), "using JSON file snapshot store");
            run_with_store(store).await
        }
        Backend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::MissingDatabaseUrl)?;
            let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let store = PostgresSnapshotStore::new(pool, &config.restaurant_name);
            store
                .run_migrations()
                .await
                .map_err(SnapshotStoreError::from)?;
            tracing::info!(restaurant = %config.restaurant_name, "using PostgreSQL snapshot store");
            run_with_store(store).await
        }
    }
}
