use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{models::ModelError, storage::Entity};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(ModelError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ModelError::InvalidPriority(s.to_string())),
        }
    }
}

/// A unit of work belonging to a project.
///
/// `completed_at` is set exactly when `status` is [`TaskStatus::Done`]; every
/// mutation below keeps that true. Records read back from storage are checked
/// against the same rule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    /// Caller-assigned identifier, never changes
    id: String,
    /// Title of the task
    title: String,
    /// Free-form description
    description: String,
    /// Workflow state
    status: TaskStatus,
    /// How urgent the task is
    priority: Priority,
    /// When the task should be finished by
    due_date: Option<Timestamp>,
    /// Back-reference to the owning project
    project_id: String,
    /// When the task was created
    created_at: Timestamp,
    /// When the task was completed
    completed_at: Option<Timestamp>,
}

impl Task {
    /// Creates a `Todo` task with medium priority, an empty description and no
    /// due date.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Result<Task, ModelError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModelError::EmptyId { entity: "Task" });
        }
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(ModelError::EmptyProjectId(id));
        }

        Ok(Task {
            id,
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: Priority::default(),
            due_date: None,
            project_id,
            created_at: Timestamp::now(),
            completed_at: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Task {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Task {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: Option<Timestamp>) -> Task {
        self.due_date = due_date;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Task {
        self.update_status(status);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn due_date(&self) -> Option<Timestamp> {
        self.due_date
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Moves the task to `Done` and stamps the completion time.
    ///
    /// Completing an already completed task keeps the original timestamp.
    pub fn mark_as_complete(&mut self) {
        if self.completed_at.is_none() {
            self.completed_at = Some(Timestamp::now());
        }
        self.status = TaskStatus::Done;
    }

    pub fn mark_as_in_progress(&mut self) {
        self.update_status(TaskStatus::InProgress);
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Timestamp::now())
    }

    /// Overdue means a due date exists, `now` is past it and the task is not
    /// done.
    pub fn is_overdue_at(&self, now: Timestamp) -> bool {
        match self.due_date {
            Some(due) if !self.is_done() => now > due,
            _ => false,
        }
    }

    pub fn update_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn update_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn update_status(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Done => self.mark_as_complete(),
            other => {
                self.status = other;
                self.completed_at = None;
            }
        }
    }

    pub fn update_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn update_due_date(&mut self, due_date: Option<Timestamp>) {
        self.due_date = due_date;
    }
}

impl Entity for Task {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Wire shape of a stored task, validated before it becomes a [`Task`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: String,
    title: String,
    description: String,
    status: TaskStatus,
    priority: Priority,
    #[serde(default)]
    due_date: Option<Timestamp>,
    project_id: String,
    created_at: Timestamp,
    #[serde(default)]
    completed_at: Option<Timestamp>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = ModelError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        if record.id.trim().is_empty() {
            return Err(ModelError::EmptyId { entity: "Task" });
        }
        if record.project_id.trim().is_empty() {
            return Err(ModelError::EmptyProjectId(record.id));
        }
        let done = record.status == TaskStatus::Done;
        if done != record.completed_at.is_some() {
            return Err(ModelError::CompletionMismatch {
                id: record.id,
                status: record.status,
            });
        }

        Ok(Task {
            id: record.id,
            title: record.title,
            description: record.description,
            status: record.status,
            priority: record.priority,
            due_date: record.due_date,
            project_id: record.project_id,
            created_at: record.created_at,
            completed_at: record.completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn yesterday() -> Timestamp {
        Timestamp::now()
            .checked_sub(SignedDuration::from_hours(24))
            .unwrap()
    }

    fn tomorrow() -> Timestamp {
        Timestamp::now()
            .checked_add(SignedDuration::from_hours(24))
            .unwrap()
    }

    #[test]
    fn test_new_task_is_todo_without_completion() {
        let task = Task::new("1", "Write docs", "p1").unwrap();

        assert_eq!(task.status(), TaskStatus::Todo);
        assert_eq!(task.priority(), Priority::Medium);
        assert!(task.completed_at().is_none());
        assert!(task.due_date().is_none());
    }

    #[test]
    fn test_new_task_rejects_blank_ids() {
        assert_eq!(
            Task::new("  ", "t", "p1").unwrap_err(),
            ModelError::EmptyId { entity: "Task" }
        );
        assert_eq!(
            Task::new("1", "t", "").unwrap_err(),
            ModelError::EmptyProjectId("1".to_string())
        );
    }

    #[test]
    fn test_overdue_until_marked_done() {
        let mut task = Task::new("1", "Ship it", "p1")
            .unwrap()
            .with_priority(Priority::High)
            .with_due_date(Some(yesterday()));
        assert!(task.is_overdue());

        task.mark_as_complete();

        assert!(!task.is_overdue());
        assert_eq!(task.status(), TaskStatus::Done);
        assert!(task.completed_at().is_some());
    }

    #[test]
    fn test_not_overdue_without_due_date_or_before_deadline() {
        let undated = Task::new("1", "a", "p1").unwrap();
        let future = Task::new("2", "b", "p1")
            .unwrap()
            .with_due_date(Some(tomorrow()));

        assert!(!undated.is_overdue());
        assert!(!future.is_overdue());
        assert!(future.is_overdue_at(tomorrow().checked_add(SignedDuration::from_hours(1)).unwrap()));
    }

    #[test]
    fn test_leaving_done_clears_completion() {
        let mut task = Task::new("1", "a", "p1").unwrap().with_status(TaskStatus::Done);
        assert!(task.completed_at().is_some());

        task.mark_as_in_progress();

        assert_eq!(task.status(), TaskStatus::InProgress);
        assert!(task.completed_at().is_none());
    }

    #[test]
    fn test_complete_twice_keeps_first_timestamp() {
        let mut task = Task::new("1", "a", "p1").unwrap();
        task.mark_as_complete();
        let first = task.completed_at();

        task.mark_as_complete();

        assert_eq!(task.completed_at(), first);
    }

    #[test]
    fn test_parse_status_and_priority() {
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(
            "urgent".parse::<Priority>().unwrap_err(),
            ModelError::InvalidPriority("urgent".to_string())
        );
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let task = Task::new("1", "a", "p1").unwrap();
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["projectId"], "p1");
        assert_eq!(value["status"], "todo");
        assert_eq!(value["priority"], "medium");
        assert!(value["dueDate"].is_null());
        assert!(value["completedAt"].is_null());
    }

    #[test]
    fn test_deserialize_rejects_done_without_completion() {
        let json = r#"{
            "id": "1", "title": "a", "description": "", "status": "done",
            "priority": "low", "dueDate": null, "projectId": "p1",
            "createdAt": "2024-01-01T00:00:00Z", "completedAt": null
        }"#;

        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn test_deserialize_treats_missing_dates_as_none() {
        let json = r#"{
            "id": "1", "title": "a", "description": "", "status": "todo",
            "priority": "low", "projectId": "p1",
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.due_date().is_none());
        assert!(task.completed_at().is_none());
    }
}
