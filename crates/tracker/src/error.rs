//! Use-case error types.

use common::EntityId;
use domain::{DomainError, EntityKind};
use storage::RepositoryError;
use thiserror::Error;
use transaction::TransactionFailed;

/// The operation a failed transaction was performing.
///
/// This is the failure value handed to the transaction executor, so it is
/// what callers see whichever step actually failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailedOperation {
    #[error("Failed to create user")]
    CreateUser,
    #[error("Failed to create project")]
    CreateProject,
    #[error("Failed to update project")]
    UpdateProject,
    #[error("Failed to delete project")]
    DeleteProject,
    #[error("Failed to create project state")]
    CreateProjectState,
    #[error("Failed to delete project state")]
    DeleteProjectState,
    #[error("Failed to create task")]
    CreateTask,
    #[error("Failed to update task")]
    UpdateTask,
    #[error("Failed to delete task")]
    DeleteTask,
}

/// Errors returned by [`TrackerService`](crate::TrackerService) operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Input rejected by an entity rule.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// A referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: EntityId },

    /// A reference exists but is not allowed here (e.g. a state of another project).
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The change would break a uniqueness or in-use rule.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The user lacks the role required for the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A write transaction failed and was rolled back.
    #[error(transparent)]
    Transaction(#[from] TransactionFailed<FailedOperation>),

    /// A read failed.
    #[error("Storage error: {0}")]
    Repository(#[from] RepositoryError),
}

impl TrackerError {
    /// Returns the failed operation if this error came from a rolled-back write.
    pub fn failed_operation(&self) -> Option<FailedOperation> {
        match self {
            TrackerError::Transaction(failed) => Some(*failed.error()),
            _ => None,
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: EntityId) -> Self {
        TrackerError::NotFound { kind, id }
    }
}

/// Convenience type alias for use-case results.
pub type Result<T> = std::result::Result<T, TrackerError>;
