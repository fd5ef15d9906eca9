//! Use cases of the tracker.
//!
//! Every write is one transaction: the entity change(s) followed by the
//! matching audit record(s). If any step fails the earlier ones are undone
//! and the caller gets a [`TrackerError::Transaction`] naming the operation.

use std::sync::Arc;

use common::EntityId;
use domain::{AuditAction, AuditLog, Audited, Project, ProjectState, Task, User, UserRole};
use storage::Repository;
use transaction::{Outcome, TransactionBuilder};

use crate::error::{FailedOperation, Result, TrackerError};
use crate::repositories::Repositories;

/// Entry point for all tracker operations.
///
/// `actor` parameters name the user performing the operation; they are
/// recorded in the audit trail and checked for the required role.
pub struct TrackerService {
    repos: Repositories,
}

impl TrackerService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    // ---- users -----------------------------------------------------------

    /// Returns the user named `username`, creating it if missing.
    ///
    /// The first user ever created is an admin; later ones are mates.
    #[tracing::instrument(skip(self))]
    pub async fn bootstrap_user(&self, username: &str) -> Result<User> {
        let users = self.repos.users.find_all().await?;
        if let Some(existing) = users.iter().find(|u| u.username() == username.trim()) {
            return Ok(existing.clone());
        }

        let role = if users.is_empty() {
            UserRole::Admin
        } else {
            UserRole::Mate
        };
        let user = User::new(username, role)?;

        let mut tx = TransactionBuilder::new("bootstrap_user");
        let created = tx.create(&self.repos.users, user.clone());
        tx.audit(
            &self.repos.audit_logs,
            AuditLog::of(&user, AuditAction::Created, user.id()),
        );
        commit(tx, FailedOperation::CreateUser).await?;

        tracing::info!(user_id = %user.id(), %role, "user bootstrapped");
        Ok(stored(created, user))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_user(
        &self,
        actor: EntityId,
        username: &str,
        role: UserRole,
    ) -> Result<User> {
        self.require_admin(actor).await?;
        let user = User::new(username, role)?;

        let users = self.repos.users.find_all().await?;
        if users.iter().any(|u| u.username() == user.username()) {
            return Err(TrackerError::Conflict(format!(
                "username '{}' is taken",
                user.username()
            )));
        }

        let mut tx = TransactionBuilder::new("create_user");
        let created = tx.create(&self.repos.users, user.clone());
        tx.audit(
            &self.repos.audit_logs,
            AuditLog::of(&user, AuditAction::Created, actor),
        );
        commit(tx, FailedOperation::CreateUser).await?;

        Ok(stored(created, user))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.repos.users.find_all().await?)
    }

    // ---- projects --------------------------------------------------------

    #[tracing::instrument(skip(self))]
    pub async fn create_project(
        &self,
        actor: EntityId,
        name: &str,
        description: &str,
    ) -> Result<Project> {
        self.require_admin(actor).await?;
        let project = Project::new(name, description, actor)?;

        let mut tx = TransactionBuilder::new("create_project");
        let created = tx.create(&self.repos.projects, project.clone());
        tx.audit(
            &self.repos.audit_logs,
            AuditLog::of(&project, AuditAction::Created, actor),
        );
        commit(tx, FailedOperation::CreateProject).await?;

        Ok(stored(created, project))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_project(
        &self,
        actor: EntityId,
        project_id: EntityId,
        name: &str,
        description: &str,
    ) -> Result<Project> {
        self.require_admin(actor).await?;
        let original = load(&self.repos.projects, project_id).await?;
        let mut updated = original.clone();
        updated.rename(name)?;
        updated.set_description(description);

        let mut tx = TransactionBuilder::new("update_project");
        let saved = tx.update(&self.repos.projects, original, updated.clone());
        tx.audit(
            &self.repos.audit_logs,
            AuditLog::of(&updated, AuditAction::Updated, actor),
        );
        commit(tx, FailedOperation::UpdateProject).await?;

        Ok(stored(saved, updated))
    }

    /// Deletes a project together with its states and tasks.
    #[tracing::instrument(skip(self))]
    pub async fn delete_project(&self, actor: EntityId, project_id: EntityId) -> Result<()> {
        self.require_admin(actor).await?;
        let project = load(&self.repos.projects, project_id).await?;
        let tasks = self.list_tasks(project_id).await?;
        let states = self.list_states(project_id).await?;

        let mut tx = TransactionBuilder::new("delete_project");
        for task in tasks {
            let log = AuditLog::of(&task, AuditAction::Deleted, actor);
            tx.delete(&self.repos.tasks, task);
            tx.audit(&self.repos.audit_logs, log);
        }
        for state in states {
            let log = AuditLog::of(&state, AuditAction::Deleted, actor);
            tx.delete(&self.repos.states, state);
            tx.audit(&self.repos.audit_logs, log);
        }
        let log = AuditLog::of(&project, AuditAction::Deleted, actor);
        tx.delete(&self.repos.projects, project);
        tx.audit(&self.repos.audit_logs, log);

        commit(tx, FailedOperation::DeleteProject).await
    }

    pub async fn get_project(&self, project_id: EntityId) -> Result<Project> {
        load(&self.repos.projects, project_id).await
    }

    /// Returns all projects, oldest first.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects = self.repos.projects.find_all().await?;
        projects.sort_by_key(|p| p.created_at());
        Ok(projects)
    }

    // ---- project states --------------------------------------------------

    #[tracing::instrument(skip(self))]
    pub async fn create_project_state(
        &self,
        actor: EntityId,
        project_id: EntityId,
        name: &str,
    ) -> Result<ProjectState> {
        self.require_admin(actor).await?;
        let project = load(&self.repos.projects, project_id).await?;
        let existing = self.list_states(project_id).await?;
        let position = existing.last().map_or(0, |s| s.position() + 1);
        let state = ProjectState::new(project.id(), name)?.with_position(position);

        if existing.iter().any(|s| s.name().eq_ignore_ascii_case(state.name())) {
            return Err(TrackerError::Conflict(format!(
                "project '{}' already has a state named '{}'",
                project.name(),
                state.name()
            )));
        }

        let mut tx = TransactionBuilder::new("create_project_state");
        let created = tx.create(&self.repos.states, state.clone());
        tx.audit(
            &self.repos.audit_logs,
            AuditLog::of(&state, AuditAction::Created, actor),
        );
        commit(tx, FailedOperation::CreateProjectState).await?;

        Ok(stored(created, state))
    }

    /// Deletes a state that no task is in.
    #[tracing::instrument(skip(self))]
    pub async fn delete_project_state(&self, actor: EntityId, state_id: EntityId) -> Result<()> {
        self.require_admin(actor).await?;
        let state = load(&self.repos.states, state_id).await?;

        let tasks = self.list_tasks(state.project_id()).await?;
        let in_use = tasks.iter().filter(|t| t.state_id() == state_id).count();
        if in_use > 0 {
            return Err(TrackerError::Conflict(format!(
                "state '{}' still holds {} task(s)",
                state.name(),
                in_use
            )));
        }

        let mut tx = TransactionBuilder::new("delete_project_state");
        let log = AuditLog::of(&state, AuditAction::Deleted, actor);
        tx.delete(&self.repos.states, state);
        tx.audit(&self.repos.audit_logs, log);
        commit(tx, FailedOperation::DeleteProjectState).await
    }

    /// Returns the states of a project in board order.
    pub async fn list_states(&self, project_id: EntityId) -> Result<Vec<ProjectState>> {
        let mut states: Vec<ProjectState> = self
            .repos
            .states
            .find_all()
            .await?
            .into_iter()
            .filter(|s| s.project_id() == project_id)
            .collect();
        states.sort_by_key(|s| s.position());
        Ok(states)
    }

    // ---- tasks -----------------------------------------------------------

    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        actor: EntityId,
        project_id: EntityId,
        state_id: EntityId,
        title: &str,
        description: &str,
    ) -> Result<Task> {
        load(&self.repos.users, actor).await?;
        let project = load(&self.repos.projects, project_id).await?;
        let state = self.state_of(&project, state_id).await?;
        let task = Task::new(project.id(), state.id(), title, description, actor)?;

        let mut tx = TransactionBuilder::new("create_task");
        let created = tx.create(&self.repos.tasks, task.clone());
        tx.audit(
            &self.repos.audit_logs,
            AuditLog::of(&task, AuditAction::Created, actor),
        );
        commit(tx, FailedOperation::CreateTask).await?;

        Ok(stored(created, task))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        actor: EntityId,
        task_id: EntityId,
        title: &str,
        description: &str,
    ) -> Result<Task> {
        self.change_task(actor, task_id, |task| {
            task.rename(title)?;
            task.set_description(description);
            Ok(())
        })
        .await
    }

    /// Moves a task to another state of the same project.
    #[tracing::instrument(skip(self))]
    pub async fn move_task(
        &self,
        actor: EntityId,
        task_id: EntityId,
        state_id: EntityId,
    ) -> Result<Task> {
        let task = load(&self.repos.tasks, task_id).await?;
        let project = load(&self.repos.projects, task.project_id()).await?;
        let state = self.state_of(&project, state_id).await?;

        self.change_task(actor, task_id, |task| {
            task.move_to(state.id());
            Ok(())
        })
        .await
    }

    /// Assigns a task to a user, or clears the assignment with `None`.
    #[tracing::instrument(skip(self))]
    pub async fn assign_task(
        &self,
        actor: EntityId,
        task_id: EntityId,
        assignee: Option<EntityId>,
    ) -> Result<Task> {
        if let Some(user_id) = assignee {
            load(&self.repos.users, user_id).await?;
        }

        self.change_task(actor, task_id, |task| {
            task.assign(assignee);
            Ok(())
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, actor: EntityId, task_id: EntityId) -> Result<()> {
        load(&self.repos.users, actor).await?;
        let task = load(&self.repos.tasks, task_id).await?;

        let mut tx = TransactionBuilder::new("delete_task");
        let log = AuditLog::of(&task, AuditAction::Deleted, actor);
        tx.delete(&self.repos.tasks, task);
        tx.audit(&self.repos.audit_logs, log);
        commit(tx, FailedOperation::DeleteTask).await
    }

    pub async fn get_task(&self, task_id: EntityId) -> Result<Task> {
        load(&self.repos.tasks, task_id).await
    }

    /// Returns the tasks of a project, oldest first.
    pub async fn list_tasks(&self, project_id: EntityId) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .repos
            .tasks
            .find_all()
            .await?
            .into_iter()
            .filter(|t| t.project_id() == project_id)
            .collect();
        tasks.sort_by_key(|t| t.created_at());
        Ok(tasks)
    }

    // ---- audit -----------------------------------------------------------

    /// Returns the audit records of one entity, oldest first.
    pub async fn audit_trail(&self, entity_id: EntityId) -> Result<Vec<AuditLog>> {
        let mut logs: Vec<AuditLog> = self
            .repos
            .audit_logs
            .find_all()
            .await?
            .into_iter()
            .filter(|log| log.entity_id() == entity_id)
            .collect();
        logs.sort_by_key(|log| log.created_at());
        Ok(logs)
    }

    // ---- helpers ---------------------------------------------------------

    async fn require_admin(&self, actor: EntityId) -> Result<User> {
        let user = load(&self.repos.users, actor).await?;
        if !user.is_admin() {
            return Err(TrackerError::PermissionDenied(format!(
                "'{}' is not an admin",
                user.username()
            )));
        }
        Ok(user)
    }

    /// Loads `state_id` and checks it belongs to `project`.
    async fn state_of(&self, project: &Project, state_id: EntityId) -> Result<ProjectState> {
        let state = load(&self.repos.states, state_id).await?;
        if state.project_id() != project.id() {
            return Err(TrackerError::InvalidReference(format!(
                "state '{}' does not belong to project '{}'",
                state.name(),
                project.name()
            )));
        }
        Ok(state)
    }

    /// Applies `change` to a task and stores it with an `Updated` audit record.
    async fn change_task(
        &self,
        actor: EntityId,
        task_id: EntityId,
        change: impl FnOnce(&mut Task) -> Result<()>,
    ) -> Result<Task> {
        load(&self.repos.users, actor).await?;
        let original = load(&self.repos.tasks, task_id).await?;
        let mut updated = original.clone();
        change(&mut updated)?;

        let mut tx = TransactionBuilder::new("update_task");
        let saved = tx.update(&self.repos.tasks, original, updated.clone());
        tx.audit(
            &self.repos.audit_logs,
            AuditLog::of(&updated, AuditAction::Updated, actor),
        );
        commit(tx, FailedOperation::UpdateTask).await?;

        Ok(stored(saved, updated))
    }
}

async fn load<E: Audited>(repository: &Arc<dyn Repository<E>>, id: EntityId) -> Result<E> {
    repository
        .find_by_id(id)
        .await?
        .ok_or(TrackerError::not_found(E::KIND, id))
}

async fn commit(tx: TransactionBuilder, failure: FailedOperation) -> Result<()> {
    tx.build(failure).run().await?;
    Ok(())
}

/// Returns the entity recorded by a committed step.
fn stored<E: Clone>(outcome: Outcome<E>, fallback: E) -> E {
    outcome.take().unwrap_or(fallback)
}
