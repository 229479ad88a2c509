//! Project lifecycle use-case.

use crate::model::project::{Project, ProjectId};
use crate::repo::project_repo::ProjectRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub struct ProjectService<P: ProjectRepository> {
    repo: P,
}

impl<P: ProjectRepository> ProjectService<P> {
    pub fn new(repo: P) -> Self {
        Self { repo }
    }

    /// Creates an active project; names must be unique among active projects.
    pub fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
        color: Option<&str>,
    ) -> ServiceResult<Project> {
        if name.trim().is_empty() {
            return Err(ServiceError::EmptyInput("project name"));
        }

        let mut project = Project::new(name);
        if let Some(description) = description.map(str::trim).filter(|value| !value.is_empty()) {
            project = project.with_description(description);
        }
        if let Some(color) = color {
            project = project.with_color(color);
        }

        self.repo.create_project(&project)?;
        info!(
            "event=project_create module=service status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    pub fn list_active_projects(&self) -> ServiceResult<Vec<Project>> {
        Ok(self.repo.list_active_projects()?)
    }

    /// Names the project classifier matches against.
    pub fn active_project_names(&self) -> ServiceResult<Vec<String>> {
        Ok(self
            .repo
            .list_active_projects()?
            .into_iter()
            .map(|project| project.name)
            .collect())
    }

    /// Soft-deletes a project; its notes move to the fallback project.
    pub fn delete_project(&self, id: ProjectId) -> ServiceResult<usize> {
        Ok(self.repo.soft_delete_project(id)?)
    }
}
