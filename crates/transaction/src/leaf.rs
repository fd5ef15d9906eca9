//! Leaf commands: one repository call forward, one compensating call back.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use storage::{Entity, Repository, RepositoryError};

use crate::command::{Command, ensure_executed, ensure_pending};
use crate::error::CommandError;
use crate::state::CommandState;

/// Shared handle to the entity a leaf command actually wrote.
///
/// Filled by a successful `execute`, cleared by `undo`. The use case keeps a
/// clone of the handle to read the stored entity once the transaction
/// commits.
#[derive(Debug)]
pub struct Outcome<E>(Arc<Mutex<Option<E>>>);

impl<E> Clone for Outcome<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> Default for Outcome<E> {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }
}

impl<E: Clone> Outcome<E> {
    /// Returns a copy of the recorded entity, if any.
    pub fn get(&self) -> Option<E> {
        self.slot().clone()
    }

    /// Removes and returns the recorded entity.
    pub fn take(&self) -> Option<E> {
        self.slot().take()
    }

    fn set(&self, entity: E) {
        *self.slot() = Some(entity);
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<E>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates an entity; undo deletes it.
pub struct CreateCommand<E: Entity> {
    name: String,
    repository: Arc<dyn Repository<E>>,
    entity: E,
    outcome: Outcome<E>,
    state: CommandState,
}

impl<E: Entity> CreateCommand<E> {
    pub fn new(repository: Arc<dyn Repository<E>>, entity: E) -> Self {
        Self {
            name: format!("{}.create", E::collection()),
            repository,
            entity,
            outcome: Outcome::default(),
            state: CommandState::Pending,
        }
    }

    /// Returns a handle to the created entity.
    pub fn outcome(&self) -> Outcome<E> {
        self.outcome.clone()
    }
}

#[async_trait]
impl<E: Entity> Command for CreateCommand<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> CommandState {
        self.state
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        ensure_pending(&*self)?;
        match self.repository.create(self.entity.clone()).await {
            Ok(created) => {
                self.outcome.set(created);
                self.state = CommandState::Executed;
                Ok(())
            }
            Err(e) => {
                self.state = CommandState::Failed;
                Err(e.into())
            }
        }
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        ensure_executed(&*self)?;
        let id = self
            .outcome
            .get()
            .map_or_else(|| self.entity.id(), |created| created.id());

        match self.repository.delete(id).await {
            Ok(()) => {}
            // Already gone: the compensation goal is met.
            Err(e) if e.is_not_found() => {
                tracing::warn!(command = %self.name, %id, "entity already deleted during undo");
            }
            Err(e) => return Err(e.into()),
        }

        self.outcome.take();
        self.state = CommandState::Undone;
        Ok(())
    }
}

/// Replaces an entity; undo writes the original content back.
///
/// `updated` must carry the same version as `original`, which is the version
/// currently stored.
pub struct UpdateCommand<E: Entity> {
    name: String,
    repository: Arc<dyn Repository<E>>,
    original: E,
    updated: E,
    outcome: Outcome<E>,
    state: CommandState,
}

impl<E: Entity> UpdateCommand<E> {
    pub fn new(repository: Arc<dyn Repository<E>>, original: E, updated: E) -> Self {
        Self {
            name: format!("{}.update", E::collection()),
            repository,
            original,
            updated,
            outcome: Outcome::default(),
            state: CommandState::Pending,
        }
    }

    /// Returns a handle to the entity as stored after the update.
    pub fn outcome(&self) -> Outcome<E> {
        self.outcome.clone()
    }
}

#[async_trait]
impl<E: Entity> Command for UpdateCommand<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> CommandState {
        self.state
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        ensure_pending(&*self)?;
        match self.repository.update(self.updated.clone()).await {
            Ok(stored) => {
                self.outcome.set(stored);
                self.state = CommandState::Executed;
                Ok(())
            }
            Err(e) => {
                self.state = CommandState::Failed;
                Err(e.into())
            }
        }
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        ensure_executed(&*self)?;
        // The restore must carry the version our update produced, otherwise
        // the repository rejects it as stale. A conflict here means someone
        // else changed the entity after us and is reported, not overwritten.
        let mut restore = self.original.clone();
        if let Some(stored) = self.outcome.get() {
            restore.set_version(stored.version());
        }

        self.repository.update(restore).await?;
        self.outcome.take();
        self.state = CommandState::Undone;
        Ok(())
    }
}

/// Deletes an entity; undo restores the captured copy, version included.
pub struct DeleteCommand<E: Entity> {
    name: String,
    repository: Arc<dyn Repository<E>>,
    entity: E,
    outcome: Outcome<E>,
    state: CommandState,
}

impl<E: Entity> DeleteCommand<E> {
    /// `entity` is the stored entity, captured before deletion.
    pub fn new(repository: Arc<dyn Repository<E>>, entity: E) -> Self {
        Self {
            name: format!("{}.delete", E::collection()),
            repository,
            entity,
            outcome: Outcome::default(),
            state: CommandState::Pending,
        }
    }

    /// Returns a handle to the deleted entity.
    pub fn outcome(&self) -> Outcome<E> {
        self.outcome.clone()
    }
}

#[async_trait]
impl<E: Entity> Command for DeleteCommand<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> CommandState {
        self.state
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        ensure_pending(&*self)?;
        match self.repository.delete(self.entity.id()).await {
            Ok(()) => {
                self.outcome.set(self.entity.clone());
                self.state = CommandState::Executed;
                Ok(())
            }
            Err(e) => {
                self.state = CommandState::Failed;
                Err(e.into())
            }
        }
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        ensure_executed(&*self)?;
        match self.repository.restore(self.entity.clone()).await {
            Ok(_) => {}
            Err(RepositoryError::AlreadyExists { id, .. }) => {
                tracing::warn!(command = %self.name, %id, "entity already restored during undo");
            }
            Err(e) => return Err(e.into()),
        }

        self.outcome.take();
        self.state = CommandState::Undone;
        Ok(())
    }
}
