use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Result, Snapshot, SnapshotStoreError, Version,
    store::{SaveOptions, SnapshotStore, check_expected_version, record_load, record_save},
};

/// PostgreSQL-backed snapshot store.
///
/// Each restaurant occupies one row of `restaurant_snapshots`, keyed by name.
#[derive(Clone)]
pub struct PostgresSnapshotStore {
    pool: PgPool,
    name: String,
}

impl PostgresSnapshotStore {
    /// Creates a store for the restaurant called `name`.
    pub fn new(pool: PgPool, name: impl Into<String>) -> Self {
        Self {
            pool,
            name: name.into(),
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_snapshot(row: PgRow) -> Result<Snapshot> {
        Ok(Snapshot {
            version: Version::new(row.try_get("version")?),
            timestamp: row.try_get::<DateTime<Utc>, _>("timestamp")?,
            state: row.try_get("state")?,
        })
    }

    async fn write(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        let stored: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM restaurant_snapshots WHERE name = $1 FOR UPDATE",
        )
        .bind(&self.name)
        .fetch_optional(&mut *tx)
        .await?;

        check_expected_version(
            Version::new(stored.unwrap_or(0)),
            &snapshot,
            &options,
        )?;

        let write = if stored.is_none() {
            sqlx::query(
                r#"
                INSERT INTO restaurant_snapshots (name, version, timestamp, state)
                VALUES ($1, $2, $3, $4)
                "#,
            )
        } else {
            sqlx::query(
                r#"
                UPDATE restaurant_snapshots
                SET version = $2, timestamp = $3, state = $4
                WHERE name = $1
                "#,
            )
        };

        write
            .bind(&self.name)
            .bind(snapshot.version.as_i64())
            .bind(snapshot.timestamp)
            .bind(&snapshot.state)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // A concurrent first save won the primary key.
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("restaurant_snapshots_pkey")
                {
                    return SnapshotStoreError::ConcurrencyConflict {
                        expected: Version::initial(),
                        actual: Version::first(),
                    };
                }
                SnapshotStoreError::Database(e)
            })?;

        tx.commit().await?;
        Ok(snapshot.version)
    }

    async fn read(&self) -> Result<Option<Snapshot>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT version, timestamp, state
            FROM restaurant_snapshots
            WHERE name = $1
            "#,
        )
        .bind(&self.name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_snapshot).transpose()
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    #[tracing::instrument(skip(self, snapshot), fields(restaurant = %self.name, version = %snapshot.version))]
    async fn save_snapshot(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version> {
        let started = Instant::now();
        let result = self.write(snapshot, options).await;
        record_save("postgres", started, &result);
        result
    }

    async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        let started = Instant::now();
        let result = self.read().await;
        record_load("postgres", started, &result);
        result
    }
}
