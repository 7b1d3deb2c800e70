//! Persistence gateway for restaurant state.
//!
//! The store treats the snapshot payload as opaque JSON; interpreting it is
//! the domain layer's job.

pub mod error;
pub mod file;
pub mod memory;
pub mod postgres;
pub mod snapshot;
pub mod store;

pub use error::{Result, SnapshotStoreError};
pub use file::JsonFileSnapshotStore;
pub use memory::InMemorySnapshotStore;
pub use postgres::PostgresSnapshotStore;
pub use snapshot::{Snapshot, Version};
pub use store::{SaveOptions, SnapshotStore, check_expected_version};
