use jiff::Timestamp;

use crate::models::{
    ModelError,
    task::{Priority, Task, TaskStatus},
};

/// Narrows a task collection. Implementations keep input order, never add or
/// modify tasks, and hold no state that changes between calls.
pub trait TaskFilter {
    fn filter(&self, tasks: &[Task]) -> Vec<Task>;
}

fn retain(tasks: &[Task], predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
    tasks.iter().filter(|t| predicate(t)).cloned().collect()
}

/// Applies `filters` left to right. The resulting membership does not depend
/// on the order.
pub fn apply_all(filters: &[&dyn TaskFilter], tasks: &[Task]) -> Vec<Task> {
    filters
        .iter()
        .fold(tasks.to_vec(), |remaining, filter| filter.filter(&remaining))
}

#[derive(Debug, Clone, Copy)]
pub struct StatusFilter {
    status: TaskStatus,
}

impl StatusFilter {
    pub fn new(status: TaskStatus) -> Self {
        Self { status }
    }
}

impl TaskFilter for StatusFilter {
    fn filter(&self, tasks: &[Task]) -> Vec<Task> {
        retain(tasks, |t| t.status() == self.status)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PriorityFilter {
    priority: Priority,
}

impl PriorityFilter {
    pub fn new(priority: Priority) -> Self {
        Self { priority }
    }
}

impl TaskFilter for PriorityFilter {
    fn filter(&self, tasks: &[Task]) -> Vec<Task> {
        retain(tasks, |t| t.priority() == self.priority)
    }
}

/// Keeps overdue tasks. Without a pinned instant the clock is read on every
/// call, so results can change between calls that straddle a deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverdueFilter {
    as_of: Option<Timestamp>,
}

impl OverdueFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_of(now: Timestamp) -> Self {
        Self { as_of: Some(now) }
    }
}

impl TaskFilter for OverdueFilter {
    fn filter(&self, tasks: &[Task]) -> Vec<Task> {
        let now = self.as_of.unwrap_or_else(Timestamp::now);
        retain(tasks, |t| t.is_overdue_at(now))
    }
}

/// Keeps tasks due within `[start, end]`, both ends inclusive. Undated tasks
/// never match.
#[derive(Debug, Clone, Copy)]
pub struct DueDateRangeFilter {
    start: Timestamp,
    end: Timestamp,
}

impl DueDateRangeFilter {
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ModelError> {
        if start > end {
            return Err(ModelError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }
}

impl TaskFilter for DueDateRangeFilter {
    fn filter(&self, tasks: &[Task]) -> Vec<Task> {
        retain(tasks, |t| {
            t.due_date()
                .is_some_and(|due| due >= self.start && due <= self.end)
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProjectFilter {
    project_id: String,
}

impl ProjectFilter {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }
}

impl TaskFilter for ProjectFilter {
    fn filter(&self, tasks: &[Task]) -> Vec<Task> {
        retain(tasks, |t| t.project_id() == self.project_id)
    }
}
