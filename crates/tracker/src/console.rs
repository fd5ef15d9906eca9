//! Line-oriented console front end.
//!
//! Each input line is parsed into an [`Input`] and handed to
//! [`Console::handle`]. Entities are referenced by full id, by a unique id
//! prefix (the eight digits the console prints) or by name.

use std::fmt::Write as _;
use std::str::FromStr;

use common::EntityId;
use domain::{AuditLog, Project, ProjectState, Task, User, UserRole};
use storage::Repository;
use thiserror::Error;

use crate::error::TrackerError;
use crate::service::TrackerService;

pub const HELP: &str = "\
commands:
  users                                 list users
  add-user <name> [admin]               create a user (admin only)
  projects                              list projects
  add-project <name>                    create a project (admin only)
  rename-project <project> <name>       rename a project (admin only)
  delete-project <project>              delete a project and its contents (admin only)
  states <project>                      list the states of a project
  add-state <project> <name>            add a state to a project (admin only)
  delete-state <project> <state>        delete an unused state (admin only)
  tasks <project>                       list tasks grouped by state
  add-task <project> <state> <title>    create a task
  rename-task <task> <title>            change a task title
  move-task <task> <state>              move a task to another state
  assign <task> <user|none>             assign or unassign a task
  delete-task <task>                    delete a task
  log <id>                              show the audit trail of an entity
  help                                  show this text
  quit                                  leave the console";

/// Errors reported back to the console user.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("unknown command '{0}', type 'help'")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("no {kind} matches '{query}'")]
    Unresolved { kind: &'static str, query: String },

    #[error("'{query}' is ambiguous ({count} {kind} matches), use a longer id")]
    Ambiguous {
        kind: &'static str,
        query: String,
        count: usize,
    },

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl From<storage::RepositoryError> for ConsoleError {
    fn from(err: storage::RepositoryError) -> Self {
        ConsoleError::Tracker(err.into())
    }
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Help,
    Quit,
    Users,
    AddUser { username: String, admin: bool },
    Projects,
    AddProject { name: String },
    RenameProject { project: String, name: String },
    DeleteProject { project: String },
    States { project: String },
    AddState { project: String, name: String },
    DeleteState { project: String, state: String },
    Tasks { project: String },
    AddTask { project: String, state: String, title: String },
    RenameTask { task: String, title: String },
    MoveTask { task: String, state: String },
    Assign { task: String, user: Option<String> },
    DeleteTask { task: String },
    Log { id: String },
}

impl FromStr for Input {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let Some((verb, rest)) = next_word(line) else {
            return Err(ConsoleError::UnknownCommand(String::new()));
        };

        let input = match verb {
            "help" | "?" => Input::Help,
            "quit" | "exit" => Input::Quit,
            "users" => Input::Users,
            "add-user" => {
                let usage = ConsoleError::Usage("add-user <name> [admin]");
                let (username, flag) = next_word(rest).ok_or(usage)?;
                let admin = match flag.trim() {
                    "" => false,
                    "admin" => true,
                    _ => return Err(ConsoleError::Usage("add-user <name> [admin]")),
                };
                Input::AddUser {
                    username: username.to_string(),
                    admin,
                }
            }
            "projects" => Input::Projects,
            "add-project" => Input::AddProject {
                name: text(rest).ok_or(ConsoleError::Usage("add-project <name>"))?,
            },
            "rename-project" => {
                let (project, name) = word_and_text(rest)
                    .ok_or(ConsoleError::Usage("rename-project <project> <name>"))?;
                Input::RenameProject { project, name }
            }
            "delete-project" => Input::DeleteProject {
                project: single(rest).ok_or(ConsoleError::Usage("delete-project <project>"))?,
            },
            "states" => Input::States {
                project: single(rest).ok_or(ConsoleError::Usage("states <project>"))?,
            },
            "add-state" => {
                let (project, name) = word_and_text(rest)
                    .ok_or(ConsoleError::Usage("add-state <project> <name>"))?;
                Input::AddState { project, name }
            }
            "delete-state" => {
                let (project, state) = pair(rest)
                    .ok_or(ConsoleError::Usage("delete-state <project> <state>"))?;
                Input::DeleteState { project, state }
            }
            "tasks" => Input::Tasks {
                project: single(rest).ok_or(ConsoleError::Usage("tasks <project>"))?,
            },
            "add-task" => {
                let usage = "add-task <project> <state> <title>";
                let (project, rest) = next_word(rest).ok_or(ConsoleError::Usage(usage))?;
                let (state, title) = word_and_text(rest).ok_or(ConsoleError::Usage(usage))?;
                Input::AddTask {
                    project: project.to_string(),
                    state,
                    title,
                }
            }
            "rename-task" => {
                let (task, title) = word_and_text(rest)
                    .ok_or(ConsoleError::Usage("rename-task <task> <title>"))?;
                Input::RenameTask { task, title }
            }
            "move-task" => {
                let (task, state) =
                    pair(rest).ok_or(ConsoleError::Usage("move-task <task> <state>"))?;
                Input::MoveTask { task, state }
            }
            "assign" => {
                let (task, user) =
                    pair(rest).ok_or(ConsoleError::Usage("assign <task> <user|none>"))?;
                let user = (user != "none").then_some(user);
                Input::Assign { task, user }
            }
            "delete-task" => Input::DeleteTask {
                task: single(rest).ok_or(ConsoleError::Usage("delete-task <task>"))?,
            },
            "log" => Input::Log {
                id: single(rest).ok_or(ConsoleError::Usage("log <id>"))?,
            },
            other => return Err(ConsoleError::UnknownCommand(other.to_string())),
        };
        Ok(input)
    }
}

/// What the console should do after a line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// A console session acting as one user.
pub struct Console {
    service: TrackerService,
    user: User,
}

impl Console {
    pub fn new(service: TrackerService, user: User) -> Self {
        Self { service, user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Parses and runs one input line.
    pub async fn handle(&self, line: &str) -> Result<Reply, ConsoleError> {
        let input: Input = line.parse()?;
        tracing::debug!(?input, "console input");
        self.run(input).await
    }

    async fn run(&self, input: Input) -> Result<Reply, ConsoleError> {
        let actor = self.user.id();
        let service = &self.service;

        let text = match input {
            Input::Help => HELP.to_string(),
            Input::Quit => return Ok(Reply::Quit),
            Input::Users => {
                let users = service.list_users().await?;
                lines(users.iter().map(|u| {
                    format!("{}  {} ({})", u.id().short(), u.username(), u.role())
                }))
            }
            Input::AddUser { username, admin } => {
                let role = if admin { UserRole::Admin } else { UserRole::Mate };
                let user = service.create_user(actor, &username, role).await?;
                format!("created user {} {}", user.id().short(), user.username())
            }
            Input::Projects => {
                let projects = service.list_projects().await?;
                lines(projects.iter().map(describe_project))
            }
            Input::AddProject { name } => {
                let project = service.create_project(actor, &name, "").await?;
                format!("created project {}", describe_project(&project))
            }
            Input::RenameProject { project, name } => {
                let project = self.project(&project).await?;
                let renamed = service
                    .update_project(actor, project.id(), &name, project.description())
                    .await?;
                format!("renamed project {}", describe_project(&renamed))
            }
            Input::DeleteProject { project } => {
                let project = self.project(&project).await?;
                service.delete_project(actor, project.id()).await?;
                format!("deleted project {}", project.name())
            }
            Input::States { project } => {
                let project = self.project(&project).await?;
                let states = service.list_states(project.id()).await?;
                lines(states.iter().map(|s| format!("{}  {}", s.id().short(), s.name())))
            }
            Input::AddState { project, name } => {
                let project = self.project(&project).await?;
                let state = service
                    .create_project_state(actor, project.id(), &name)
                    .await?;
                format!("created state {} {}", state.id().short(), state.name())
            }
            Input::DeleteState { project, state } => {
                let project = self.project(&project).await?;
                let state = self.state(&project, &state).await?;
                service.delete_project_state(actor, state.id()).await?;
                format!("deleted state {}", state.name())
            }
            Input::Tasks { project } => {
                let project = self.project(&project).await?;
                self.board(&project).await?
            }
            Input::AddTask {
                project,
                state,
                title,
            } => {
                let project = self.project(&project).await?;
                let state = self.state(&project, &state).await?;
                let task = service
                    .create_task(actor, project.id(), state.id(), &title, "")
                    .await?;
                format!("created task {}", describe_task(&task))
            }
            Input::RenameTask { task, title } => {
                let task = self.task(&task).await?;
                let task = service
                    .update_task(actor, task.id(), &title, task.description())
                    .await?;
                format!("renamed task {}", describe_task(&task))
            }
            Input::MoveTask { task, state } => {
                let task = self.task(&task).await?;
                let project = service.get_project(task.project_id()).await?;
                let state = self.state(&project, &state).await?;
                let task = service.move_task(actor, task.id(), state.id()).await?;
                format!("moved task {} to {}", describe_task(&task), state.name())
            }
            Input::Assign { task, user } => {
                let task = self.task(&task).await?;
                let assignee = match user {
                    Some(query) => Some(self.find_user(&query).await?),
                    None => None,
                };
                service
                    .assign_task(actor, task.id(), assignee.as_ref().map(User::id))
                    .await?;
                match assignee {
                    Some(user) => format!("assigned {} to {}", task.title(), user.username()),
                    None => format!("unassigned {}", task.title()),
                }
            }
            Input::DeleteTask { task } => {
                let task = self.task(&task).await?;
                service.delete_task(actor, task.id()).await?;
                format!("deleted task {}", task.title())
            }
            Input::Log { id } => {
                let entity_id = self.audited_id(&id).await?;
                let trail = service.audit_trail(entity_id).await?;
                lines(trail.iter().map(describe_log))
            }
        };

        Ok(Reply::Text(text))
    }

    async fn board(&self, project: &Project) -> Result<String, ConsoleError> {
        let states = self.service.list_states(project.id()).await?;
        let tasks = self.service.list_tasks(project.id()).await?;

        let mut out = String::new();
        for state in &states {
            let _ = writeln!(out, "[{}]", state.name());
            for task in tasks.iter().filter(|t| t.state_id() == state.id()) {
                let _ = writeln!(out, "  {}", describe_task(task));
            }
        }
        Ok(out.trim_end().to_string())
    }

    async fn project(&self, query: &str) -> Result<Project, ConsoleError> {
        let projects = self.service.list_projects().await?;
        resolve("project", query, projects, Project::id, Project::name)
    }

    async fn state(&self, project: &Project, query: &str) -> Result<ProjectState, ConsoleError> {
        let states = self.service.list_states(project.id()).await?;
        resolve("state", query, states, ProjectState::id, ProjectState::name)
    }

    async fn task(&self, query: &str) -> Result<Task, ConsoleError> {
        let tasks = self.service.repositories().tasks.find_all().await?;
        resolve("task", query, tasks, Task::id, Task::title)
    }

    async fn find_user(&self, query: &str) -> Result<User, ConsoleError> {
        let users = self.service.list_users().await?;
        resolve("user", query, users, User::id, User::username)
    }

    /// Resolves an id prefix against every entity that has audit records,
    /// including deleted ones.
    async fn audited_id(&self, query: &str) -> Result<EntityId, ConsoleError> {
        if let Ok(id) = query.parse::<EntityId>() {
            return Ok(id);
        }

        let logs = self.service.repositories().audit_logs.find_all().await?;
        let mut ids: Vec<EntityId> = logs.iter().map(AuditLog::entity_id).collect();
        ids.sort();
        ids.dedup();

        let prefix = query.to_ascii_lowercase();
        let matches: Vec<EntityId> = ids
            .into_iter()
            .filter(|id| id.as_uuid().simple().to_string().starts_with(&prefix))
            .collect();
        single_match("entity", query, matches)
    }
}

/// Picks the one item whose id starts with `query` or whose name equals it.
fn resolve<T>(
    kind: &'static str,
    query: &str,
    items: Vec<T>,
    id: impl Fn(&T) -> EntityId,
    name: impl Fn(&T) -> &str,
) -> Result<T, ConsoleError> {
    if let Ok(full) = query.parse::<EntityId>() {
        let found = items.into_iter().find(|item| id(item) == full);
        return found.ok_or_else(|| ConsoleError::Unresolved {
            kind,
            query: query.to_string(),
        });
    }

    let prefix = query.to_ascii_lowercase();
    let (by_name, others): (Vec<T>, Vec<T>) = items
        .into_iter()
        .partition(|item| name(item).eq_ignore_ascii_case(query));
    if !by_name.is_empty() {
        return single_match(kind, query, by_name);
    }

    let by_id = others
        .into_iter()
        .filter(|item| id(item).as_uuid().simple().to_string().starts_with(&prefix))
        .collect();
    single_match(kind, query, by_id)
}

fn single_match<T>(kind: &'static str, query: &str, mut found: Vec<T>) -> Result<T, ConsoleError> {
    match found.len() {
        0 => Err(ConsoleError::Unresolved {
            kind,
            query: query.to_string(),
        }),
        1 => Ok(found.remove(0)),
        count => Err(ConsoleError::Ambiguous {
            kind,
            query: query.to_string(),
            count,
        }),
    }
}

fn describe_project(project: &Project) -> String {
    if project.description().is_empty() {
        format!("{}  {}", project.id().short(), project.name())
    } else {
        format!(
            "{}  {}: {}",
            project.id().short(),
            project.name(),
            project.description()
        )
    }
}

fn describe_task(task: &Task) -> String {
    match task.assigned_to() {
        Some(user) => format!("{}  {} (@{})", task.id().short(), task.title(), user.short()),
        None => format!("{}  {}", task.id().short(), task.title()),
    }
}

fn describe_log(log: &AuditLog) -> String {
    format!(
        "{}  {}  by {}",
        log.created_at().format("%Y-%m-%d %H:%M:%S"),
        log.details(),
        log.performed_by().short()
    )
}

fn lines(items: impl Iterator<Item = String>) -> String {
    let out: Vec<String> = items.collect();
    if out.is_empty() {
        "(none)".to_string()
    } else {
        out.join("\n")
    }
}

/// Splits off the first whitespace-separated word.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    Some(match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    })
}

fn text(input: &str) -> Option<String> {
    let input = input.trim();
    (!input.is_empty()).then(|| input.to_string())
}

fn single(input: &str) -> Option<String> {
    match next_word(input)? {
        (word, "") => Some(word.to_string()),
        _ => None,
    }
}

fn pair(input: &str) -> Option<(String, String)> {
    let (first, rest) = next_word(input)?;
    Some((first.to_string(), single(rest)?))
}

fn word_and_text(input: &str) -> Option<(String, String)> {
    let (first, rest) = next_word(input)?;
    Some((first.to_string(), text(rest)?))
}
