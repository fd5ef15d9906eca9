//! Audit trail records.

use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};
use storage::{Entity, Version};

use crate::{Project, ProjectState, Task, User};

/// The kind of entity an audit record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Project,
    ProjectState,
    Task,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "Project",
            EntityKind::ProjectState => "ProjectState",
            EntityKind::Task => "Task",
            EntityKind::User => "User",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to the audited entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "Created",
            AuditAction::Updated => "Updated",
            AuditAction::Deleted => "Deleted",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entity whose writes are recorded in the audit trail.
pub trait Audited: Entity {
    const KIND: EntityKind;

    /// Short human-readable summary stored with the audit record.
    fn describe(&self) -> String;
}

impl Audited for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn describe(&self) -> String {
        format!("project '{}'", self.name())
    }
}

impl Audited for ProjectState {
    const KIND: EntityKind = EntityKind::ProjectState;

    fn describe(&self) -> String {
        format!("state '{}'", self.name())
    }
}

impl Audited for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn describe(&self) -> String {
        format!("task '{}'", self.title())
    }
}

impl Audited for User {
    const KIND: EntityKind = EntityKind::User;

    fn describe(&self) -> String {
        format!("user '{}' ({})", self.username(), self.role())
    }
}

/// One audit trail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    id: EntityId,
    #[serde(default)]
    version: Version,
    entity_kind: EntityKind,
    entity_id: EntityId,
    action: AuditAction,
    performed_by: EntityId,
    details: String,
    created_at: DateTime<Utc>,
}

impl_entity!(AuditLog, "audit_logs");

impl AuditLog {
    pub fn new(
        entity_kind: EntityKind,
        entity_id: EntityId,
        action: AuditAction,
        performed_by: EntityId,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            version: Version::initial(),
            entity_kind,
            entity_id,
            action,
            performed_by,
            details: details.into(),
            created_at: Utc::now(),
        }
    }

    /// Builds the record for `action` applied to `entity`.
    pub fn of<E: Audited>(entity: &E, action: AuditAction, performed_by: EntityId) -> Self {
        Self::new(
            E::KIND,
            entity.id(),
            action,
            performed_by,
            format!("{} {}", action.as_str().to_lowercase(), entity.describe()),
        )
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity_kind(&self) -> EntityKind {
        self.entity_kind
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn action(&self) -> AuditAction {
        self.action
    }

    pub fn performed_by(&self) -> EntityId {
        self.performed_by
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
