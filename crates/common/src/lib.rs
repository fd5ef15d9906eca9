//! Shared types used across the task tracker crates.

pub mod types;

pub use types::EntityId;
