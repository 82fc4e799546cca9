use std::collections::HashMap;

use crate::storage::{Entity, Repository, StorageError};

/// Process-local repository keyed by entity id. Contents are gone when the
/// value is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryRepository<E> {
    entities: HashMap<String, E>,
}

impl<E> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    fn save(&mut self, entity: E) -> Result<(), StorageError> {
        tracing::debug!(id = entity.id(), "saved entity in memory");
        self.entities.insert(entity.id().to_string(), entity);
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<E>, StorageError> {
        Ok(self.entities.get(id).cloned())
    }

    fn find_all(&self) -> Result<Vec<E>, StorageError> {
        Ok(self.entities.values().cloned().collect())
    }

    fn update(&mut self, entity: E) -> Result<(), StorageError> {
        if let Some(slot) = self.entities.get_mut(entity.id()) {
            tracing::debug!(id = entity.id(), "updated entity in memory");
            *slot = entity;
        }
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        if self.entities.remove(id).is_some() {
            tracing::debug!(id, "deleted entity from memory");
        }
        Ok(())
    }
}

pub type InMemoryTaskRepository = InMemoryRepository<crate::models::task::Task>;
pub type InMemoryProjectRepository = InMemoryRepository<crate::models::project::Project>;
