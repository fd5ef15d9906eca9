use thiserror::Error;

use crate::{EntityId, Version};

/// Errors raised by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No entity with the given id exists in the collection.
    #[error("{collection} {id} not found")]
    NotFound {
        collection: &'static str,
        id: EntityId,
    },

    /// An entity with the given id already exists in the collection.
    #[error("{collection} {id} already exists")]
    AlreadyExists {
        collection: &'static str,
        id: EntityId,
    },

    /// The stored version did not match the version carried by the update.
    #[error(
        "Version conflict for {collection} {id}: expected version {expected}, found {actual}"
    )]
    VersionConflict {
        collection: &'static str,
        id: EntityId,
        expected: Version,
        actual: Version,
    },

    /// The backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing a collection file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A collection file could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    /// Returns true if the error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
