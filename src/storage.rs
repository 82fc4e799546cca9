use std::path::PathBuf;

use thiserror::Error;

use crate::models::task::{Priority, Task, TaskStatus};

pub mod json;
pub mod memory;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to load store from '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to save store to '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize store to JSON: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },
}

/// Anything a [`Repository`] can hold: a value with a stable string id.
pub trait Entity: Clone {
    fn id(&self) -> &str;
}

/// Lifecycle operations shared by every backend.
///
/// Backends are interchangeable: whatever one returns after a sequence of
/// calls, the other returns too (up to the order of `find_all`).
pub trait Repository<E: Entity> {
    /// Inserts `entity`, replacing any stored entity with the same id.
    fn save(&mut self, entity: E) -> Result<(), StorageError>;

    /// Returns `None` when nothing is stored under `id`.
    fn find_by_id(&self, id: &str) -> Result<Option<E>, StorageError>;

    fn find_all(&self) -> Result<Vec<E>, StorageError>;

    /// Replaces the stored entity with the same id. Does nothing when the id
    /// is unknown; call [`Repository::find_by_id`] first to tell the cases
    /// apart.
    fn update(&mut self, entity: E) -> Result<(), StorageError>;

    /// Removes the entity if present. Unknown ids are ignored.
    fn delete(&mut self, id: &str) -> Result<(), StorageError>;
}

/// Task lookups layered on [`Repository::find_all`]. Each one is a linear
/// scan, not a maintained index.
pub trait TaskRepository: Repository<Task> {
    fn find_by_project_id(&self, project_id: &str) -> Result<Vec<Task>, StorageError> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|t| t.project_id() == project_id)
            .collect())
    }

    fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StorageError> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|t| t.status() == status)
            .collect())
    }

    fn find_by_priority(&self, priority: Priority) -> Result<Vec<Task>, StorageError> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|t| t.priority() == priority)
            .collect())
    }
}

impl<R: Repository<Task> + ?Sized> TaskRepository for R {}
