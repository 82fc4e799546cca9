use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use slug::slugify;

use crate::{models::ModelError, storage::Entity};

/// A named group of tasks. Tasks point at their project through
/// `Task::project_id`; the project holds no task list of its own.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "ProjectRecord")]
pub struct Project {
    /// Caller-assigned identifier, never changes
    id: String,
    /// Name of the project
    name: String,
    /// Description of the project
    description: String,
    /// Created at timestamp of the project
    created_at: Timestamp,
}

impl Project {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Project, ModelError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModelError::EmptyId { entity: "Project" });
        }

        Ok(Project {
            id,
            name: name.into(),
            description: description.into(),
            created_at: Timestamp::now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Derived from the current name, never stored
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn update_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn update_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }
}

impl Entity for Project {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRecord {
    id: String,
    name: String,
    description: String,
    created_at: Timestamp,
}

impl TryFrom<ProjectRecord> for Project {
    type Error = ModelError;

    fn try_from(record: ProjectRecord) -> Result<Self, Self::Error> {
        if record.id.trim().is_empty() {
            return Err(ModelError::EmptyId { entity: "Project" });
        }
        Ok(Project {
            id: record.id,
            name: record.name,
            description: record.description,
            created_at: record.created_at,
        })
    }
}
