use jiff::Timestamp;
use thiserror::Error;

pub mod project;
pub mod task;

/// Caller-misuse errors raised when an entity or one of its fields is built
/// from invalid input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{entity} id must not be empty")]
    EmptyId { entity: &'static str },

    #[error("Task '{0}' must belong to a project")]
    EmptyProjectId(String),

    #[error("Invalid status '{0}' (expected todo, in_progress or done)")]
    InvalidStatus(String),

    #[error("Invalid priority '{0}' (expected low, medium or high)")]
    InvalidPriority(String),

    #[error("Invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("Invalid due date range: {start} is after {end}")]
    InvalidDateRange { start: Timestamp, end: Timestamp },

    #[error("Task '{id}' has status '{status}' but its completion timestamp disagrees")]
    CompletionMismatch { id: String, status: task::TaskStatus },
}
