use slug::slugify;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{ModelError, project::Project, task::Task},
    storage::{Repository, StorageError, TaskRepository},
};

/// Finds a project by exact id first, then by slug of its name.
pub fn find_project(
    projects: &impl Repository<Project>,
    id_or_slug: &str,
) -> Result<Option<Project>, StorageError> {
    if let Some(project) = projects.find_by_id(id_or_slug)? {
        return Ok(Some(project));
    }
    let wanted = slugify(id_or_slug);
    Ok(projects
        .find_all()?
        .into_iter()
        .find(|p| p.slug() == wanted))
}

#[derive(Debug, Error)]
pub enum CreateProjectError {
    #[error("Project with name '{}' already exists", .0)]
    ProjectAlreadyExists(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct CreateProjectParameters {
    /// Generated when absent
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

pub fn create_project(
    projects: &mut impl Repository<Project>,
    parameters: CreateProjectParameters,
) -> Result<Project, CreateProjectError> {
    let project_slug = slugify(&parameters.name);
    let taken = projects.find_all()?.into_iter().any(|p| {
        p.slug() == project_slug || parameters.id.as_deref() == Some(p.id())
    });
    if taken {
        return Err(CreateProjectError::ProjectAlreadyExists(parameters.name));
    }

    let id = parameters
        .id
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string()[..8].to_string());
    let project = Project::new(id, parameters.name, parameters.description.unwrap_or_default())?;

    projects.save(project.clone())?;
    tracing::info!(id = project.id(), slug = %project_slug, "created project");

    Ok(project)
}

#[derive(Debug, Error)]
pub enum DeleteProjectError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DeleteProjectParameters {
    pub id_or_slug: String,
}

pub struct DeleteProjectResult {
    pub project: Project,
    pub cascaded_tasks_count: usize,
}

/// Deletes the project and every task pointing at it.
pub fn delete_project(
    projects: &mut impl Repository<Project>,
    tasks: &mut impl TaskRepository,
    parameters: DeleteProjectParameters,
) -> Result<DeleteProjectResult, DeleteProjectError> {
    let project = find_project(&*projects, &parameters.id_or_slug)?
        .ok_or(DeleteProjectError::ProjectNotFound(parameters.id_or_slug))?;

    let owned = tasks.find_by_project_id(project.id())?;
    for task in &owned {
        tasks.delete(task.id())?;
    }
    projects.delete(project.id())?;

    Ok(DeleteProjectResult {
        project,
        cascaded_tasks_count: owned.len(),
    })
}

#[derive(Debug, Error)]
pub enum ViewProjectError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub fn project_tasks(
    projects: &impl Repository<Project>,
    tasks: &impl TaskRepository,
    id_or_slug: &str,
) -> Result<(Project, Vec<Task>), ViewProjectError> {
    let project = find_project(projects, id_or_slug)?
        .ok_or_else(|| ViewProjectError::ProjectNotFound(id_or_slug.to_string()))?;
    let mut owned = tasks.find_by_project_id(project.id())?;
    owned.sort_by_key(|t| t.created_at());
    Ok((project, owned))
}
