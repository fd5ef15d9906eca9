//! Domain layer for the task tracker.
//!
//! This crate provides the persisted entities:
//! - [`Project`] and its workflow [`ProjectState`]s
//! - [`Task`], which always sits in one state of its project
//! - [`User`]
//! - [`AuditLog`], one record per write made through a use case

/// Implements `storage::Entity` for a struct with `id` and `version` fields.
macro_rules! impl_entity {
    ($ty:ty, $collection:literal) => {
        impl storage::Entity for $ty {
            fn collection() -> &'static str {
                $collection
            }

            fn id(&self) -> common::EntityId {
                self.id
            }

            fn version(&self) -> storage::Version {
                self.version
            }

            fn set_version(&mut self, version: storage::Version) {
                self.version = version;
            }
        }
    };
}

pub mod audit;
pub mod error;
pub mod project;
pub mod task;
pub mod user;

pub use audit::{AuditAction, AuditLog, Audited, EntityKind};
pub use error::DomainError;
pub use project::{Project, ProjectState};
pub use task::Task;
pub use user::{User, UserRole};
