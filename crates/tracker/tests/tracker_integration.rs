//! Use cases run end to end against in-memory and JSON file repositories.

use std::error::Error as _;
use std::sync::Arc;

use domain::{AuditAction, AuditLog, Project, ProjectState, Task, User, UserRole};
use storage::{Entity, InMemoryRepository, Repository, RepositoryError};
use tracker::{FailedOperation, Repositories, TrackerError, TrackerService};

/// Service over in-memory repositories whose handles stay reachable for
/// failure injection and inspection.
struct Fixture {
    service: TrackerService,
    admin: User,
    projects: InMemoryRepository<Project>,
    states: InMemoryRepository<ProjectState>,
    tasks: InMemoryRepository<Task>,
    audit_logs: InMemoryRepository<AuditLog>,
}

impl Fixture {
    async fn new() -> Self {
        let users = InMemoryRepository::<User>::new();
        let projects = InMemoryRepository::<Project>::new();
        let states = InMemoryRepository::<ProjectState>::new();
        let tasks = InMemoryRepository::<Task>::new();
        let audit_logs = InMemoryRepository::<AuditLog>::new();

        let service = TrackerService::new(Repositories {
            users: Arc::new(users),
            projects: Arc::new(projects.clone()),
            states: Arc::new(states.clone()),
            tasks: Arc::new(tasks.clone()),
            audit_logs: Arc::new(audit_logs.clone()),
        });
        let admin = service.bootstrap_user("admin").await.unwrap();

        Self {
            service,
            admin,
            projects,
            states,
            tasks,
            audit_logs,
        }
    }

    fn actor(&self) -> common::EntityId {
        self.admin.id()
    }

    /// A project with "todo" and "done" states.
    async fn board(&self) -> (Project, ProjectState, ProjectState) {
        let project = self
            .service
            .create_project(self.actor(), "Website", "public site")
            .await
            .unwrap();
        let todo = self
            .service
            .create_project_state(self.actor(), project.id(), "todo")
            .await
            .unwrap();
        let done = self
            .service
            .create_project_state(self.actor(), project.id(), "done")
            .await
            .unwrap();
        (project, todo, done)
    }
}

#[tokio::test]
async fn test_bootstrap_first_user_is_admin_and_idempotent() {
    let fx = Fixture::new().await;
    assert!(fx.admin.is_admin());

    let again = fx.service.bootstrap_user("admin").await.unwrap();
    assert_eq!(again.id(), fx.admin.id());

    let mate = fx.service.bootstrap_user("bob").await.unwrap();
    assert_eq!(mate.role(), UserRole::Mate);
    assert_eq!(fx.service.list_users().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_task_writes_task_and_audit_log() {
    let fx = Fixture::new().await;
    let (project, todo, _) = fx.board().await;

    let task = fx
        .service
        .create_task(fx.actor(), project.id(), todo.id(), "Write copy", "")
        .await
        .unwrap();

    assert_eq!(task.version().as_u64(), 1);
    assert_eq!(fx.service.list_tasks(project.id()).await.unwrap(), vec![task.clone()]);

    let trail = fx.service.audit_trail(task.id()).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action(), AuditAction::Created);
    assert_eq!(trail[0].performed_by(), fx.actor());
    assert_eq!(trail[0].details(), "created task 'Write copy'");
}

#[tokio::test]
async fn test_audit_failure_rolls_back_created_task() {
    let fx = Fixture::new().await;
    let (project, todo, _) = fx.board().await;
    let logs_before = fx.audit_logs.len().await;

    fx.audit_logs.set_fail_on_create(true);
    let err = fx
        .service
        .create_task(fx.actor(), project.id(), todo.id(), "Doomed", "")
        .await
        .unwrap_err();

    assert_eq!(err.failed_operation(), Some(FailedOperation::CreateTask));
    assert_eq!(err.to_string(), "Failed to create task");
    assert!(fx.tasks.is_empty().await);
    assert_eq!(fx.audit_logs.len().await, logs_before);

    let cause = err.source().unwrap().to_string();
    assert!(cause.contains("audit_logs create rejected"), "{cause}");
}

#[tokio::test]
async fn test_first_step_failure_leaves_nothing_behind() {
    let fx = Fixture::new().await;
    let (project, todo, _) = fx.board().await;
    let logs_before = fx.audit_logs.len().await;

    fx.tasks.set_fail_on_create(true);
    let err = fx
        .service
        .create_task(fx.actor(), project.id(), todo.id(), "Doomed", "")
        .await
        .unwrap_err();

    assert_eq!(err.failed_operation(), Some(FailedOperation::CreateTask));
    assert_eq!(fx.audit_logs.len().await, logs_before);
}

#[tokio::test]
async fn test_move_task_and_rollback_on_audit_failure() {
    let fx = Fixture::new().await;
    let (project, todo, done) = fx.board().await;
    let task = fx
        .service
        .create_task(fx.actor(), project.id(), todo.id(), "Ship", "")
        .await
        .unwrap();

    let moved = fx.service.move_task(fx.actor(), task.id(), done.id()).await.unwrap();
    assert_eq!(moved.state_id(), done.id());
    assert_eq!(moved.version().as_u64(), 2);

    fx.audit_logs.set_fail_on_create(true);
    let err = fx
        .service
        .move_task(fx.actor(), task.id(), todo.id())
        .await
        .unwrap_err();
    assert_eq!(err.failed_operation(), Some(FailedOperation::UpdateTask));

    // The update was reverted by writing the previous content back.
    let stored = fx.service.get_task(task.id()).await.unwrap();
    assert_eq!(stored.state_id(), done.id());
    assert_eq!(stored.version().as_u64(), 4);
}

#[tokio::test]
async fn test_move_task_rejects_state_of_other_project() {
    let fx = Fixture::new().await;
    let (project, todo, _) = fx.board().await;
    let other = fx
        .service
        .create_project(fx.actor(), "Mobile", "")
        .await
        .unwrap();
    let foreign = fx
        .service
        .create_project_state(fx.actor(), other.id(), "todo")
        .await
        .unwrap();
    let task = fx
        .service
        .create_task(fx.actor(), project.id(), todo.id(), "Ship", "")
        .await
        .unwrap();

    let err = fx
        .service
        .move_task(fx.actor(), task.id(), foreign.id())
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidReference(_)));
}

#[tokio::test]
async fn test_update_and_assign_task() {
    let fx = Fixture::new().await;
    let (project, todo, _) = fx.board().await;
    let bob = fx
        .service
        .create_user(fx.actor(), "bob", UserRole::Mate)
        .await
        .unwrap();
    let task = fx
        .service
        .create_task(fx.actor(), project.id(), todo.id(), "Draft", "")
        .await
        .unwrap();

    let task = fx
        .service
        .update_task(bob.id(), task.id(), "Final", "ready for review")
        .await
        .unwrap();
    assert_eq!(task.title(), "Final");
    assert_eq!(task.description(), "ready for review");

    let task = fx
        .service
        .assign_task(fx.actor(), task.id(), Some(bob.id()))
        .await
        .unwrap();
    assert_eq!(task.assigned_to(), Some(bob.id()));

    let trail = fx.service.audit_trail(task.id()).await.unwrap();
    let actions: Vec<AuditAction> = trail.iter().map(AuditLog::action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::Created, AuditAction::Updated, AuditAction::Updated]
    );
    assert_eq!(trail[1].performed_by(), bob.id());
}

#[tokio::test]
async fn test_admin_only_operations() {
    let fx = Fixture::new().await;
    let mate = fx
        .service
        .create_user(fx.actor(), "mate", UserRole::Mate)
        .await
        .unwrap();

    let err = fx
        .service
        .create_project(mate.id(), "Secret", "")
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::PermissionDenied(_)));

    let err = fx
        .service
        .create_user(mate.id(), "eve", UserRole::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_validation_and_uniqueness() {
    let fx = Fixture::new().await;
    let (project, _, _) = fx.board().await;

    let err = fx
        .service
        .create_project(fx.actor(), "   ", "")
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::Validation(_)));

    let err = fx
        .service
        .create_project_state(fx.actor(), project.id(), "TODO")
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::Conflict(_)));

    let err = fx
        .service
        .create_user(fx.actor(), "admin", UserRole::Mate)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::Conflict(_)));
}

#[tokio::test]
async fn test_delete_state_in_use_is_refused() {
    let fx = Fixture::new().await;
    let (project, todo, done) = fx.board().await;
    fx.service
        .create_task(fx.actor(), project.id(), todo.id(), "Ship", "")
        .await
        .unwrap();

    let err = fx
        .service
        .delete_project_state(fx.actor(), todo.id())
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::Conflict(_)));

    fx.service
        .delete_project_state(fx.actor(), done.id())
        .await
        .unwrap();
    let states = fx.service.list_states(project.id()).await.unwrap();
    assert_eq!(states, vec![todo]);
}

#[tokio::test]
async fn test_delete_project_cascades_in_one_transaction() {
    let fx = Fixture::new().await;
    let (project, todo, _) = fx.board().await;
    let task = fx
        .service
        .create_task(fx.actor(), project.id(), todo.id(), "Ship", "")
        .await
        .unwrap();

    fx.service.delete_project(fx.actor(), project.id()).await.unwrap();

    assert!(fx.projects.is_empty().await);
    assert!(fx.states.is_empty().await);
    assert!(fx.tasks.is_empty().await);

    let trail = fx.service.audit_trail(task.id()).await.unwrap();
    assert_eq!(trail.last().unwrap().action(), AuditAction::Deleted);
}

#[tokio::test]
async fn test_delete_project_failure_restores_everything() {
    let fx = Fixture::new().await;
    let (project, todo, done) = fx.board().await;
    let review = fx
        .service
        .create_project_state(fx.actor(), project.id(), "review")
        .await
        .unwrap();
    let first = fx
        .service
        .create_task(fx.actor(), project.id(), todo.id(), "Ship", "")
        .await
        .unwrap();
    let second = fx
        .service
        .create_task(fx.actor(), project.id(), done.id(), "Test", "")
        .await
        .unwrap();
    let first = fx
        .service
        .update_task(fx.actor(), first.id(), "Ship it", "")
        .await
        .unwrap();
    assert_eq!(first.version().as_u64(), 2);
    let logs_before = fx.audit_logs.len().await;

    // Tasks and states are deleted before the project itself.
    fx.projects.set_fail_on_delete(true);
    let err = fx
        .service
        .delete_project(fx.actor(), project.id())
        .await
        .unwrap_err();

    assert_eq!(err.failed_operation(), Some(FailedOperation::DeleteProject));
    assert_eq!(fx.audit_logs.len().await, logs_before);

    // Restored entities come back unchanged, in their original order.
    assert_eq!(
        fx.service.list_states(project.id()).await.unwrap(),
        vec![todo, done, review]
    );
    assert_eq!(
        fx.service.list_tasks(project.id()).await.unwrap(),
        vec![first.clone(), second]
    );

    // The restored version still guards against stale writes.
    let mut stale = first.clone();
    storage::Entity::set_version(&mut stale, storage::Version::first());
    let result = fx.service.repositories().tasks.update(stale).await;
    assert!(matches!(result, Err(RepositoryError::VersionConflict { .. })));
    assert_eq!(fx.service.get_task(first.id()).await.unwrap(), first);
}

#[tokio::test]
async fn test_missing_references_are_not_found() {
    let fx = Fixture::new().await;
    let ghost = common::EntityId::new();

    let err = fx
        .service
        .create_project_state(fx.actor(), ghost, "todo")
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { id, .. } if id == ghost));

    let err = fx.service.delete_task(fx.actor(), ghost).await.unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { .. }));
}

#[tokio::test]
async fn test_json_file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (project_id, task_id) = {
        let service = TrackerService::new(Repositories::json_files(dir.path()));
        let admin = service.bootstrap_user("admin").await.unwrap();
        let project = service
            .create_project(admin.id(), "Website", "")
            .await
            .unwrap();
        let todo = service
            .create_project_state(admin.id(), project.id(), "todo")
            .await
            .unwrap();
        let task = service
            .create_task(admin.id(), project.id(), todo.id(), "Persist me", "")
            .await
            .unwrap();
        (project.id(), task.id())
    };

    assert!(dir.path().join("tasks.json").exists());

    let service = TrackerService::new(Repositories::json_files(dir.path()));
    let admin = service.bootstrap_user("admin").await.unwrap();
    assert!(admin.is_admin());

    let tasks = service.list_tasks(project_id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title(), "Persist me");
    assert_eq!(service.audit_trail(task_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_repository_errors_are_not_transaction_failures() {
    let fx = Fixture::new().await;
    assert!(fx.service.list_projects().await.unwrap().is_empty());
    assert!(fx.service.repositories().tasks.find_all().await.unwrap().is_empty());

    let err: TrackerError = RepositoryError::Unavailable("down".to_string()).into();
    assert_eq!(err.to_string(), "Storage error: Storage unavailable: down");
    assert!(err.failed_operation().is_none());
}
