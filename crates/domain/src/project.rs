//! Projects and their workflow states.

use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize};
use storage::Version;

use crate::error::{DomainError, required_name};

/// A project groups tasks and owns the set of states those tasks move through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    id: EntityId,
    #[serde(default)]
    version: Version,
    name: String,
    description: String,
    created_by: EntityId,
    created_at: DateTime<Utc>,
}

impl_entity!(Project, "projects");

impl Project {
    /// Creates a new, not yet stored, project.
    pub fn new(name: &str, description: &str, created_by: EntityId) -> Result<Self, DomainError> {
        Ok(Self {
            id: EntityId::new(),
            version: Version::initial(),
            name: required_name("project name", name)?,
            description: description.trim().to_string(),
            created_by,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_by(&self) -> EntityId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        self.name = required_name("project name", name)?;
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.trim().to_string();
    }
}

/// A named column of a project's workflow ("To do", "Done", ...).
///
/// `position` orders the columns of one project, lowest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    id: EntityId,
    #[serde(default)]
    version: Version,
    project_id: EntityId,
    name: String,
    #[serde(default)]
    position: u32,
}

impl_entity!(ProjectState, "project_states");

impl ProjectState {
    pub fn new(project_id: EntityId, name: &str) -> Result<Self, DomainError> {
        Ok(Self {
            id: EntityId::new(),
            version: Version::initial(),
            project_id,
            name: required_name("state name", name)?,
            position: 0,
        })
    }

    /// Places the state at `position` among its project's states.
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn project_id(&self) -> EntityId {
        self.project_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        self.name = required_name("state name", name)?;
        Ok(())
    }
}
