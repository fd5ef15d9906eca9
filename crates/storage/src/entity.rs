//! The contract every persisted entity fulfils.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Optimistic concurrency counter carried by every entity.
///
/// A freshly constructed entity has version 0; the repository stamps version 1
/// on create and bumps it on every successful update. Updates carrying a stale
/// version are rejected with [`RepositoryError::VersionConflict`].
///
/// [`RepositoryError::VersionConflict`]: crate::RepositoryError::VersionConflict
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the version of an entity that has never been stored.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version stamped on create.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted entity.
pub trait Entity: Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection (file, table) holding entities of this type.
    fn collection() -> &'static str;

    fn id(&self) -> EntityId;

    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);
}
