//! Compensating transactions over repositories without native transactions.
//!
//! A use case describes its writes as an ordered list of [`Command`]s, each
//! wrapping exactly one repository call and knowing how to reverse it. The
//! [`TransactionalCommand`] executor runs the list in order; if a step fails,
//! every step that already executed is undone in reverse order and the
//! caller receives the failure value it supplied up front, with the original
//! step error attached as its source.
//!
//! ```text
//! execute:  c1 ─► c2 ─► c3 ✗
//! undo:           c2 ◄─ c1        (c3 never undone)
//! ```

pub mod builder;
pub mod command;
pub mod error;
pub mod executor;
pub mod leaf;
pub mod state;

pub use builder::{Step, TransactionBuilder};
pub use command::Command;
pub use error::{CommandError, CompensationFailure, TransactionFailed};
pub use executor::TransactionalCommand;
pub use leaf::{CreateCommand, DeleteCommand, Outcome, UpdateCommand};
pub use state::CommandState;
