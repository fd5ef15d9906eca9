//! Persistence boundary for the task tracker.
//!
//! Every entity type is stored through a [`Repository`], a single-purpose
//! collaborator exposing create/update/delete plus simple reads. Two backends
//! are provided: [`InMemoryRepository`] for tests and ephemeral sessions, and
//! [`JsonFileRepository`] which keeps one JSON document file per collection.
//!
//! Neither backend offers multi-entity transactions; atomicity across
//! repositories is the job of the `transaction` crate.

pub mod entity;
pub mod error;
pub mod file;
pub mod memory;
pub mod repository;

pub use common::EntityId;
pub use entity::{Entity, Version};
pub use error::{RepositoryError, Result};
pub use file::JsonFileRepository;
pub use memory::InMemoryRepository;
pub use repository::Repository;
