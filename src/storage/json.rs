use std::{
    fs::{self, OpenOptions, rename, write},
    marker::PhantomData,
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::to_string_pretty;
use uuid::Uuid;

use crate::{
    models::{project::Project, task::Task},
    storage::{Entity, Repository, StorageError},
};

/// Repository backed by a single JSON file holding the whole collection as an
/// array.
///
/// Nothing is cached: every read parses the file again and every write loads,
/// edits and rewrites all of it. Two handles on the same file see each other's
/// writes, but there is no merge, so concurrent writers lose updates.
#[derive(Debug, Clone)]
pub struct JsonFileRepository<E> {
    path: PathBuf,
    entity: PhantomData<fn() -> E>,
}

pub type JsonFileTaskRepository = JsonFileRepository<Task>;
pub type JsonFileProjectRepository = JsonFileRepository<Project>;

impl<E> JsonFileRepository<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    /// Opens the store at `path`, creating parent directories and an empty
    /// `[]` collection if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let repository = Self {
            path: path.into(),
            entity: PhantomData,
        };

        if let Some(parent) = repository
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).map_err(|e| StorageError::SaveFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let file_exists = fs::exists(&repository.path).map_err(|e| StorageError::LoadFailed {
            path: repository.path.clone(),
            source: e,
        })?;
        if !file_exists {
            repository.write_all(&[])?;
            tracing::info!(path = %repository.path.display(), "initialized empty store");
        }

        Ok(repository)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<E>, StorageError> {
        let content = fs::read_to_string(&self.path).map_err(|e| StorageError::LoadFailed {
            path: self.path.clone(),
            source: e,
        })?;

        let entities: Vec<E> =
            serde_json::from_str(&content).map_err(|e| StorageError::ParseFailed {
                path: self.path.clone(),
                source: e,
            })?;
        tracing::debug!(path = %self.path.display(), count = entities.len(), "loaded store");
        Ok(entities)
    }

    /// Rewrites the whole file. The new content goes to a temp file first and
    /// is renamed over the store while the sibling `.lock` file is held.
    fn write_all(&self, entities: &[E]) -> Result<(), StorageError> {
        let json =
            to_string_pretty(entities).map_err(|e| StorageError::SerializeFailed { source: e })?;

        let unique_temp = format!("{}.tmp.{}", self.path.display(), Uuid::new_v4());
        let temp_path = PathBuf::from(&unique_temp);
        write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        let swapped = self.swap_in(&temp_path);
        if swapped.is_err() {
            if let Err(e) = fs::remove_file(&temp_path) {
                tracing::warn!(path = %temp_path.display(), error = %e, "failed to remove temp file");
            }
        }
        swapped?;

        tracing::debug!(path = %self.path.display(), count = entities.len(), "wrote store");
        Ok(())
    }

    /// Renames `temp_path` over the store while holding the `.lock` file.
    fn swap_in(&self, temp_path: &Path) -> Result<(), StorageError> {
        let lock_file_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path,
                source: e,
            })?;

        rename(temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        FileExt::unlock(&lock_file).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl<E> Repository<E> for JsonFileRepository<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    fn save(&mut self, entity: E) -> Result<(), StorageError> {
        let mut entities = self.load()?;
        match entities.iter_mut().find(|e| e.id() == entity.id()) {
            Some(existing) => *existing = entity.clone(),
            None => entities.push(entity.clone()),
        }
        self.write_all(&entities)?;
        tracing::info!(id = entity.id(), path = %self.path.display(), "saved entity to file");
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<E>, StorageError> {
        Ok(self.load()?.into_iter().find(|e| e.id() == id))
    }

    fn find_all(&self) -> Result<Vec<E>, StorageError> {
        self.load()
    }

    fn update(&mut self, entity: E) -> Result<(), StorageError> {
        let mut entities = self.load()?;
        let Some(existing) = entities.iter_mut().find(|e| e.id() == entity.id()) else {
            tracing::debug!(id = entity.id(), "update skipped, entity not found");
            return Ok(());
        };
        *existing = entity.clone();
        self.write_all(&entities)?;
        tracing::info!(id = entity.id(), path = %self.path.display(), "updated entity in file");
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        let mut entities = self.load()?;
        let before = entities.len();
        entities.retain(|e| e.id() != id);
        if entities.len() == before {
            tracing::debug!(id, "delete skipped, entity not found");
            return Ok(());
        }
        self.write_all(&entities)?;
        tracing::info!(id, path = %self.path.display(), "deleted entity from file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::{
        models::task::TaskStatus,
        storage::{TaskRepository, contract},
    };

    #[test]
    fn test_task_repository_contract() {
        let dir = tempfile::tempdir().unwrap();
        let counter = Cell::new(0);
        contract::run_all(|| {
            counter.set(counter.get() + 1);
            JsonFileTaskRepository::open(dir.path().join(format!("tasks-{}.json", counter.get())))
                .unwrap()
        });
    }

    #[test]
    fn test_open_initializes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.json");

        let repo = JsonFileTaskRepository::open(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert!(repo.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_open_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut first = JsonFileTaskRepository::open(&path).unwrap();
        first.save(Task::new("1", "a", "p1").unwrap()).unwrap();

        let reopened = JsonFileTaskRepository::open(&path).unwrap();

        assert_eq!(reopened.find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_round_trip_keeps_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut repo = JsonFileTaskRepository::open(&path).unwrap();
        let open = Task::new("1", "Open", "p1").unwrap();
        let done = Task::new("2", "Done", "p2")
            .unwrap()
            .with_due_date(Some("2024-02-29T23:59:59Z".parse().unwrap()))
            .with_status(TaskStatus::Done);

        repo.save(open.clone()).unwrap();
        repo.save(done.clone()).unwrap();

        let reopened = JsonFileTaskRepository::open(&path).unwrap();
        assert_eq!(reopened.find_all().unwrap(), vec![open, done]);
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw[0]["dueDate"].is_null());
        assert!(raw[0]["completedAt"].is_null());
        assert_eq!(raw[1]["status"], "done");
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let repo = JsonFileTaskRepository::open(&path).unwrap();

        match repo.find_all() {
            Err(StorageError::ParseFailed { .. }) => {}
            other => panic!("Expected ParseFailed error, got {:?}", other),
        }
        assert!(matches!(
            repo.find_by_project_id("p1"),
            Err(StorageError::ParseFailed { .. })
        ));
    }

    #[test]
    fn test_write_on_corrupt_file_fails_without_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "[{\"id\": 3}]").unwrap();
        let mut repo = JsonFileTaskRepository::open(&path).unwrap();

        let result = repo.save(Task::new("1", "a", "p1").unwrap());

        assert!(matches!(result, Err(StorageError::ParseFailed { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[{\"id\": 3}]");
    }

    #[test]
    fn test_record_breaking_completion_invariant_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[{"id": "1", "title": "a", "description": "", "status": "todo",
                "priority": "low", "dueDate": null, "projectId": "p1",
                "createdAt": "2024-01-01T00:00:00Z",
                "completedAt": "2024-01-02T00:00:00Z"}]"#,
        )
        .unwrap();

        let repo = JsonFileTaskRepository::open(&path).unwrap();

        assert!(matches!(
            repo.find_by_id("1"),
            Err(StorageError::ParseFailed { .. })
        ));
    }

    #[test]
    fn test_unreadable_store_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileTaskRepository::open(dir.path()).unwrap();

        assert!(matches!(
            repo.find_all(),
            Err(StorageError::LoadFailed { .. })
        ));
    }

    #[test]
    fn test_two_handles_last_writer_wins() {
        // No cross-handle coordination exists; the later write replaces the
        // earlier one for the same id.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut a = JsonFileTaskRepository::open(&path).unwrap();
        let mut b = JsonFileTaskRepository::open(&path).unwrap();
        let task = Task::new("1", "original", "p1").unwrap();
        a.save(task.clone()).unwrap();

        let mut from_a = task.clone();
        from_a.update_title("from a");
        let mut from_b = task;
        from_b.update_title("from b");
        a.update(from_a).unwrap();
        b.update(from_b.clone()).unwrap();

        assert_eq!(a.find_by_id("1").unwrap(), Some(from_b));
        assert_eq!(b.find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut repo = JsonFileTaskRepository::open(&path).unwrap();
        repo.save(Task::new("1", "a", "p1").unwrap()).unwrap();
        repo.delete("1").unwrap();

        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .count();

        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut repo = JsonFileTaskRepository::open(&path).unwrap();
        fs::create_dir(dir.path().join("tasks.lock")).unwrap();

        let result = repo.save(Task::new("1", "a", "p1").unwrap());

        assert!(matches!(result, Err(StorageError::SaveFailed { .. })));
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .count();
        assert_eq!(leftovers, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_project_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileProjectRepository::open(dir.path().join("projects.json")).unwrap();
        let project = Project::new("p1", "Work", "Office").unwrap();

        repo.save(project.clone()).unwrap();

        assert_eq!(repo.find_by_id("p1").unwrap(), Some(project));
    }
}
