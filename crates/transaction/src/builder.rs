//! Typed step descriptors and the builder that turns them into a transaction.

use std::sync::Arc;

use domain::AuditLog;
use storage::{Entity, Repository};

use crate::command::Command;
use crate::executor::TransactionalCommand;
use crate::leaf::{CreateCommand, DeleteCommand, Outcome, UpdateCommand};

/// One write a use case wants to make.
#[derive(Debug, Clone)]
pub enum Step<E> {
    /// Store a new entity.
    Create(E),
    /// Replace `original` (as currently stored) with `updated`.
    Update { original: E, updated: E },
    /// Remove a stored entity, captured whole so it can be restored.
    Delete(E),
}

impl<E: Entity> Step<E> {
    /// Returns the leaf command for this step and a handle to its outcome.
    pub fn into_command(
        self,
        repository: Arc<dyn Repository<E>>,
    ) -> (Box<dyn Command>, Outcome<E>) {
        match self {
            Step::Create(entity) => {
                let command = CreateCommand::new(repository, entity);
                let outcome = command.outcome();
                (Box::new(command), outcome)
            }
            Step::Update { original, updated } => {
                let command = UpdateCommand::new(repository, original, updated);
                let outcome = command.outcome();
                (Box::new(command), outcome)
            }
            Step::Delete(entity) => {
                let command = DeleteCommand::new(repository, entity);
                let outcome = command.outcome();
                (Box::new(command), outcome)
            }
        }
    }
}

/// Collects steps in execution order and builds a [`TransactionalCommand`].
///
/// ```ignore
/// let mut tx = TransactionBuilder::new("create_task");
/// let created = tx.create(&tasks, task);
/// tx.audit(&audit_logs, log);
/// tx.build(TaskError::CreationFailed).run().await?;
/// let task = created.take();
/// ```
pub struct TransactionBuilder {
    name: String,
    commands: Vec<Box<dyn Command>>,
}

impl TransactionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// Appends a step against `repository`.
    pub fn step<E: Entity>(
        &mut self,
        repository: &Arc<dyn Repository<E>>,
        step: Step<E>,
    ) -> Outcome<E> {
        let (command, outcome) = step.into_command(Arc::clone(repository));
        self.commands.push(command);
        outcome
    }

    pub fn create<E: Entity>(
        &mut self,
        repository: &Arc<dyn Repository<E>>,
        entity: E,
    ) -> Outcome<E> {
        self.step(repository, Step::Create(entity))
    }

    pub fn update<E: Entity>(
        &mut self,
        repository: &Arc<dyn Repository<E>>,
        original: E,
        updated: E,
    ) -> Outcome<E> {
        self.step(repository, Step::Update { original, updated })
    }

    pub fn delete<E: Entity>(
        &mut self,
        repository: &Arc<dyn Repository<E>>,
        entity: E,
    ) -> Outcome<E> {
        self.step(repository, Step::Delete(entity))
    }

    /// Appends the audit record for the steps before it.
    pub fn audit(
        &mut self,
        repository: &Arc<dyn Repository<AuditLog>>,
        log: AuditLog,
    ) -> Outcome<AuditLog> {
        self.step(repository, Step::Create(log))
    }

    /// Appends an arbitrary command, such as a nested transaction.
    pub fn command(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the executor; `failure` is what the caller sees if any step fails.
    pub fn build<F>(self, failure: F) -> TransactionalCommand<F>
    where
        F: Clone + std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        TransactionalCommand::named(self.name, self.commands, failure)
    }
}
