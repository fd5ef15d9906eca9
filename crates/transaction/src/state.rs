//! Command lifecycle state machine.

/// The state of a single command instance.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Executed ──► Undone
///           └──► Failed
/// ```
///
/// A failed `undo` leaves the command `Executed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandState {
    /// Not executed yet.
    #[default]
    Pending,

    /// `execute` completed successfully; the effect is visible.
    Executed,

    /// The effect was reversed (terminal state).
    Undone,

    /// `execute` failed; nothing to reverse (terminal state).
    Failed,
}

impl CommandState {
    /// Returns true if the command can be executed.
    pub fn can_execute(&self) -> bool {
        matches!(self, CommandState::Pending)
    }

    /// Returns true if the command can be undone.
    pub fn can_undo(&self) -> bool {
        matches!(self, CommandState::Executed)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandState::Undone | CommandState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandState::Pending => "Pending",
            CommandState::Executed => "Executed",
            CommandState::Undone => "Undone",
            CommandState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CommandState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
