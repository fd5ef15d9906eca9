//! Command and transaction error types.

use storage::RepositoryError;
use thiserror::Error;

use crate::state::CommandState;

/// Errors returned by [`Command::execute`] and [`Command::undo`].
///
/// [`Command::execute`]: crate::Command::execute
/// [`Command::undo`]: crate::Command::undo
#[derive(Debug, Error)]
pub enum CommandError {
    /// The wrapped repository call failed. Passed through unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The command was asked to do something its lifecycle does not allow,
    /// such as undoing before executing.
    #[error("Command '{command}' cannot {operation} while {state}")]
    InvalidState {
        command: String,
        operation: &'static str,
        state: CommandState,
    },

    /// A nested transaction failed (and has already compensated itself).
    #[error("Nested transaction failed: {0}")]
    Nested(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Undoing a committed transaction left some steps un-reversed.
    #[error("Compensation left {} step(s) un-reversed", .0.len())]
    Compensation(Vec<CompensationFailure>),
}

impl CommandError {
    pub(crate) fn invalid_state(
        command: &str,
        operation: &'static str,
        state: CommandState,
    ) -> Self {
        CommandError::InvalidState {
            command: command.to_string(),
            operation,
            state,
        }
    }
}

/// An `undo` that failed while compensating.
#[derive(Debug, Error)]
#[error("Compensation step '{step}' failed: {error}")]
pub struct CompensationFailure {
    /// Name of the command whose `undo` failed.
    pub step: String,
    /// The error `undo` returned.
    #[source]
    pub error: CommandError,
}

/// Returned by [`TransactionalCommand::run`] when a step fails.
///
/// Displays as the caller-supplied failure value only, so callers keep seeing
/// the same error whichever step failed. The step error that triggered the
/// rollback is available through [`std::error::Error::source`] and
/// [`TransactionFailed::cause`].
///
/// [`TransactionalCommand::run`]: crate::TransactionalCommand::run
#[derive(Debug)]
pub struct TransactionFailed<F> {
    error: F,
    failed_step: String,
    cause: CommandError,
    compensation_failures: Vec<CompensationFailure>,
}

impl<F> TransactionFailed<F> {
    pub(crate) fn new(
        error: F,
        failed_step: impl Into<String>,
        cause: CommandError,
        compensation_failures: Vec<CompensationFailure>,
    ) -> Self {
        Self {
            error,
            failed_step: failed_step.into(),
            cause,
            compensation_failures,
        }
    }

    /// Returns the caller-supplied failure value.
    pub fn error(&self) -> &F {
        &self.error
    }

    /// Consumes the failure, returning the caller-supplied value.
    pub fn into_error(self) -> F {
        self.error
    }

    /// Returns the name of the step whose `execute` failed.
    pub fn failed_step(&self) -> &str {
        &self.failed_step
    }

    /// Returns the error the failing step reported.
    pub fn cause(&self) -> &CommandError {
        &self.cause
    }

    /// Returns the `undo` calls that failed during compensation.
    pub fn compensation_failures(&self) -> &[CompensationFailure] {
        &self.compensation_failures
    }

    /// Returns true if every executed step was reversed.
    pub fn is_fully_compensated(&self) -> bool {
        self.compensation_failures.is_empty()
    }
}

impl<F: std::fmt::Display> std::fmt::Display for TransactionFailed<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl<F> std::error::Error for TransactionFailed<F>
where
    F: std::fmt::Display + std::fmt::Debug,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use storage::EntityId;

    #[derive(Debug, Clone, PartialEq, Error)]
    #[error("could not save the task")]
    struct SaveFailed;

    fn not_found() -> CommandError {
        CommandError::Repository(RepositoryError::NotFound {
            collection: "tasks",
            id: EntityId::new(),
        })
    }

    #[test]
    fn test_displays_only_the_sentinel() {
        let failed = TransactionFailed::new(SaveFailed, "tasks.create", not_found(), vec![]);
        assert_eq!(failed.to_string(), "could not save the task");
        assert_eq!(failed.error(), &SaveFailed);
    }

    #[test]
    fn test_chains_the_step_error() {
        let failed = TransactionFailed::new(SaveFailed, "tasks.create", not_found(), vec![]);
        let source = failed.source().unwrap();
        assert!(source.to_string().contains("not found"));
        assert!(matches!(
            failed.cause(),
            CommandError::Repository(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_compensation_failures_reported() {
        let failure = CompensationFailure {
            step: "tasks.create".to_string(),
            error: CommandError::Repository(RepositoryError::Unavailable("down".into())),
        };
        let failed = TransactionFailed::new(
            SaveFailed,
            "audit_logs.create",
            not_found(),
            vec![failure],
        );

        assert!(!failed.is_fully_compensated());
        assert_eq!(
            failed.compensation_failures()[0].to_string(),
            "Compensation step 'tasks.create' failed: Storage unavailable: down"
        );
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CommandError::invalid_state("tasks.delete", "undo", CommandState::Pending);
        assert_eq!(
            err.to_string(),
            "Command 'tasks.delete' cannot undo while Pending"
        );
    }
}
