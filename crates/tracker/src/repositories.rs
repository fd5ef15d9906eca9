//! The set of repositories the use cases write through.

use std::path::Path;
use std::sync::Arc;

use domain::{AuditLog, Project, ProjectState, Task, User};
use storage::{InMemoryRepository, JsonFileRepository, Repository};

use crate::config::{Config, StorageKind};

/// One repository per entity type.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn Repository<User>>,
    pub projects: Arc<dyn Repository<Project>>,
    pub states: Arc<dyn Repository<ProjectState>>,
    pub tasks: Arc<dyn Repository<Task>>,
    pub audit_logs: Arc<dyn Repository<AuditLog>>,
}

impl Repositories {
    /// Repositories that live only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepository::<User>::new()),
            projects: Arc::new(InMemoryRepository::<Project>::new()),
            states: Arc::new(InMemoryRepository::<ProjectState>::new()),
            tasks: Arc::new(InMemoryRepository::<Task>::new()),
            audit_logs: Arc::new(InMemoryRepository::<AuditLog>::new()),
        }
    }

    /// Repositories keeping one JSON file per collection under `data_dir`.
    pub fn json_files(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            users: Arc::new(JsonFileRepository::<User>::new(dir)),
            projects: Arc::new(JsonFileRepository::<Project>::new(dir)),
            states: Arc::new(JsonFileRepository::<ProjectState>::new(dir)),
            tasks: Arc::new(JsonFileRepository::<Task>::new(dir)),
            audit_logs: Arc::new(JsonFileRepository::<AuditLog>::new(dir)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        match config.storage {
            StorageKind::Memory => Self::in_memory(),
            StorageKind::File => Self::json_files(&config.data_dir),
        }
    }
}
