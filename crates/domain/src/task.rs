use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};
use storage::Version;

use crate::error::{DomainError, required_name};

/// A unit of work inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: EntityId,
    #[serde(default)]
    version: Version,
    project_id: EntityId,
    state_id: EntityId,
    title: String,
    description: String,
    assigned_to: Option<EntityId>,
    created_by: EntityId,
    created_at: DateTime<Utc>,
}

impl_entity!(Task, "tasks");

impl Task {
    /// Creates a new, not yet stored, task in the given state.
    pub fn new(
        project_id: EntityId,
        state_id: EntityId,
        title: &str,
        description: &str,
        created_by: EntityId,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: EntityId::new(),
            version: Version::initial(),
            project_id,
            state_id,
            title: required_name("task title", title)?,
            description: description.trim().to_string(),
            assigned_to: None,
            created_by,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn project_id(&self) -> EntityId {
        self.project_id
    }

    pub fn state_id(&self) -> EntityId {
        self.state_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn assigned_to(&self) -> Option<EntityId> {
        self.assigned_to
    }

    pub fn created_by(&self) -> EntityId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn rename(&mut self, title: &str) -> Result<(), DomainError> {
        self.title = required_name("task title", title)?;
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.trim().to_string();
    }

    /// Moves the task to another state of its project.
    pub fn move_to(&mut self, state_id: EntityId) {
        self.state_id = state_id;
    }

    pub fn assign(&mut self, user_id: Option<EntityId>) {
        self.assigned_to = user_id;
    }
}
