//! The reversible unit of work.

use async_trait::async_trait;

use crate::error::CommandError;
use crate::state::CommandState;

/// One reversible unit of work.
///
/// Implementations must honor the [`CommandState`] lifecycle: `execute` only
/// from `Pending`, `undo` only from `Executed`. Calls made in any other state
/// return [`CommandError::InvalidState`] without side effects.
///
/// A failed `execute` must leave no visible effect and report the underlying
/// error unchanged.
#[async_trait]
pub trait Command: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    fn state(&self) -> CommandState;

    /// Performs the side effect and records what is needed to reverse it.
    async fn execute(&mut self) -> Result<(), CommandError>;

    /// Reverses a previously successful `execute`.
    async fn undo(&mut self) -> Result<(), CommandError>;
}

/// Fails with `InvalidState` unless `command` is still `Pending`.
pub(crate) fn ensure_pending(command: &dyn Command) -> Result<(), CommandError> {
    let state = command.state();
    if state.can_execute() {
        Ok(())
    } else {
        Err(CommandError::invalid_state(command.name(), "execute", state))
    }
}

/// Fails with `InvalidState` unless `command` is `Executed`.
pub(crate) fn ensure_executed(command: &dyn Command) -> Result<(), CommandError> {
    let state = command.state();
    if state.can_undo() {
        Ok(())
    } else {
        Err(CommandError::invalid_state(command.name(), "undo", state))
    }
}
