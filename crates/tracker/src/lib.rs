//! Task tracker built on compensating transactions.
//!
//! [`TrackerService`] exposes the use cases. Each write runs the entity
//! change and its audit record through a
//! [`TransactionalCommand`](transaction::TransactionalCommand), so either both
//! are stored or neither is. [`Console`] is the line-oriented front end used
//! by the `tracker` binary.

pub mod config;
pub mod console;
pub mod error;
pub mod repositories;
pub mod service;

pub use config::{Config, StorageKind};
pub use console::{Console, ConsoleError, Input, Reply};
pub use error::{FailedOperation, Result, TrackerError};
pub use repositories::Repositories;
pub use service::TrackerService;
