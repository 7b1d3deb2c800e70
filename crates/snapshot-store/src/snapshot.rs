use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version number of a persisted snapshot, used for optimistic concurrency.
///
/// Version 0 means nothing has been saved yet; every successful save
/// advances the version by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) of a store with no snapshot.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1) written by the first save.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A full serialized copy of the restaurant state at a specific version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The version this snapshot was written as.
    pub version: Version,

    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// The serialized state.
    pub state: serde_json::Value,
}

impl Snapshot {
    /// Creates a new snapshot from raw JSON state.
    pub fn new(version: Version, state: serde_json::Value) -> Self {
        Self {
            version,
            timestamp: Utc::now(),
            state,
        }
    }

    /// Creates a snapshot from a serializable state.
    pub fn from_state<T: Serialize>(version: Version, state: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(version, serde_json::to_value(state)?))
    }

    /// Deserializes the snapshot state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }
}
