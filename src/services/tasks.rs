use jiff::{Timestamp, civil::Date, tz::TimeZone};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    export::{ExportError, Exporter},
    filters::{
        DueDateRangeFilter, OverdueFilter, PriorityFilter, ProjectFilter, StatusFilter,
        TaskFilter, apply_all,
    },
    models::{
        ModelError,
        project::Project,
        task::{Priority, Task, TaskStatus},
    },
    notifications::Notifier,
    storage::{Repository, StorageError, TaskRepository},
};

/// Which end of a bare calendar date a parsed date should land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

/// Accepts an RFC 3339 timestamp or a `YYYY-MM-DD` date in the local zone.
pub fn parse_date(input: &str, bound: DayBound) -> Result<Timestamp, ModelError> {
    let input = input.trim();
    if let Ok(timestamp) = input.parse::<Timestamp>() {
        return Ok(timestamp);
    }

    let invalid = |reason: String| ModelError::InvalidDate {
        input: input.to_string(),
        reason,
    };
    let date: Date = input.parse().map_err(|e: jiff::Error| invalid(e.to_string()))?;
    let datetime = match bound {
        DayBound::Start => date.at(0, 0, 0, 0),
        DayBound::End => date.at(23, 59, 59, 999_999_999),
    };
    datetime
        .to_zoned(TimeZone::system())
        .map(|zoned| zoned.timestamp())
        .map_err(|e| invalid(e.to_string()))
}

#[derive(Debug, Error)]
pub enum AddTaskError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Task with id '{0}' already exists")]
    TaskAlreadyExists(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct AddTaskParameters {
    /// Generated when absent
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub project_id: String,
}

pub fn add_task<N: Notifier + ?Sized>(
    tasks: &mut impl TaskRepository,
    projects: &impl Repository<Project>,
    notifier: &mut N,
    parameters: AddTaskParameters,
) -> Result<Task, AddTaskError> {
    // 1. The project must exist before tasks can point at it
    if projects.find_by_id(&parameters.project_id)?.is_none() {
        return Err(AddTaskError::ProjectNotFound(parameters.project_id));
    }

    // 2. Parse deadline if provided
    let due_date = parameters
        .due_date
        .as_deref()
        .map(|d| parse_date(d, DayBound::End))
        .transpose()?;

    // 3. Ids are never reused; saving would overwrite the existing task
    let id = parameters
        .id
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string()[..8].to_string());
    if tasks.find_by_id(&id)?.is_some() {
        return Err(AddTaskError::TaskAlreadyExists(id));
    }

    // 4. Build and persist
    let task = Task::new(id, parameters.title, parameters.project_id)?
        .with_description(parameters.description.unwrap_or_default())
        .with_priority(parameters.priority)
        .with_due_date(due_date);

    tasks.save(task.clone())?;
    notifier.notify_task_created(&task);

    Ok(task)
}

#[derive(Debug, Error)]
pub enum CompleteTaskError {
    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Task '{0}' is already completed")]
    TaskAlreadyCompleted(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct CompleteTaskParameters {
    pub task_id: String,
}

pub fn complete_task<N: Notifier + ?Sized>(
    tasks: &mut impl TaskRepository,
    notifier: &mut N,
    parameters: CompleteTaskParameters,
) -> Result<Task, CompleteTaskError> {
    let mut task = tasks
        .find_by_id(&parameters.task_id)?
        .ok_or(CompleteTaskError::TaskNotFound(parameters.task_id))?;

    if task.is_done() {
        return Err(CompleteTaskError::TaskAlreadyCompleted(task.title().to_string()));
    }

    task.mark_as_complete();
    tasks.update(task.clone())?;
    notifier.notify_task_completed(&task);

    Ok(task)
}

#[derive(Debug, Error)]
pub enum StartTaskError {
    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct StartTaskParameters {
    pub task_id: String,
}

/// Moves a task to in-progress. A done task is reopened.
pub fn start_task(
    tasks: &mut impl TaskRepository,
    parameters: StartTaskParameters,
) -> Result<Task, StartTaskError> {
    let mut task = tasks
        .find_by_id(&parameters.task_id)?
        .ok_or(StartTaskError::TaskNotFound(parameters.task_id))?;

    task.mark_as_in_progress();
    tasks.update(task.clone())?;

    Ok(task)
}

#[derive(Debug, Error)]
pub enum DeleteTaskError {
    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DeleteTaskParameters {
    pub task_id: String,
}

pub fn delete_task(
    tasks: &mut impl TaskRepository,
    parameters: DeleteTaskParameters,
) -> Result<Task, DeleteTaskError> {
    let task = tasks
        .find_by_id(&parameters.task_id)?
        .ok_or(DeleteTaskError::TaskNotFound(parameters.task_id))?;

    tasks.delete(task.id())?;

    Ok(task)
}

#[derive(Debug, Error)]
pub enum ListTasksError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Every set field narrows the result; unset fields match everything.
#[derive(Debug, Default, Clone)]
pub struct ListTasksParameters {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub overdue: bool,
    pub due_from: Option<String>,
    pub due_to: Option<String>,
    pub project_id: Option<String>,
}

pub fn list_tasks(
    tasks: &impl TaskRepository,
    parameters: &ListTasksParameters,
) -> Result<Vec<Task>, ListTasksError> {
    let mut filters: Vec<Box<dyn TaskFilter>> = Vec::new();
    if let Some(status) = parameters.status {
        filters.push(Box::new(StatusFilter::new(status)));
    }
    if let Some(priority) = parameters.priority {
        filters.push(Box::new(PriorityFilter::new(priority)));
    }
    if parameters.overdue {
        filters.push(Box::new(OverdueFilter::new()));
    }
    if parameters.due_from.is_some() || parameters.due_to.is_some() {
        let start = match &parameters.due_from {
            Some(from) => parse_date(from, DayBound::Start)?,
            None => Timestamp::MIN,
        };
        let end = match &parameters.due_to {
            Some(to) => parse_date(to, DayBound::End)?,
            None => Timestamp::MAX,
        };
        filters.push(Box::new(DueDateRangeFilter::new(start, end)?));
    }
    if let Some(project_id) = &parameters.project_id {
        filters.push(Box::new(ProjectFilter::new(project_id.clone())));
    }

    let chain: Vec<&dyn TaskFilter> = filters.iter().map(|f| f.as_ref()).collect();
    let mut result = apply_all(&chain, &tasks.find_all()?);
    result.sort_by_key(|t| t.created_at());

    Ok(result)
}

#[derive(Debug, Error)]
pub enum ExportTasksError {
    #[error(transparent)]
    List(#[from] ListTasksError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub fn export_tasks(
    tasks: &impl TaskRepository,
    exporter: &dyn Exporter,
    parameters: &ListTasksParameters,
) -> Result<String, ExportTasksError> {
    let selected = list_tasks(tasks, parameters)?;
    tracing::info!(
        count = selected.len(),
        extension = exporter.file_extension(),
        "exporting tasks"
    );
    Ok(exporter.export(&selected)?)
}

/// Fires a due notification for every overdue task and returns them.
pub fn remind_overdue<N: Notifier + ?Sized>(
    tasks: &impl TaskRepository,
    notifier: &mut N,
) -> Result<Vec<Task>, StorageError> {
    let mut overdue = OverdueFilter::new().filter(&tasks.find_all()?);
    overdue.sort_by_key(|t| t.due_date());
    for task in &overdue {
        notifier.notify_task_due(task);
    }
    Ok(overdue)
}
