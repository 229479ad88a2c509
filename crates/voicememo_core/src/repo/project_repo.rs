//! Project store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, list and soft-delete projects.
//! - Reassign notes of deleted projects to the fallback project.
//!
//! # Invariants
//! - Active project names are unique case-insensitively (partial unique index).
//! - Soft delete and note reassignment commit in one transaction.
//! - The fallback project is never deleted.

use super::{ensure_tables, parse_uuid, RepoError, RepoResult};
use crate::model::project::{Project, ProjectId, FALLBACK_PROJECT_ID};
use log::info;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    color,
    is_active
FROM projects";

/// Repository interface for project persistence.
pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Case-insensitive lookup among active projects.
    fn find_active_by_name(&self, name: &str) -> RepoResult<Option<Project>>;
    /// Active projects sorted by name.
    fn list_active_projects(&self) -> RepoResult<Vec<Project>>;
    fn fallback_project(&self) -> RepoResult<Project>;
    /// Deactivates a project and returns how many notes were reassigned.
    fn soft_delete_project(&self, id: ProjectId) -> RepoResult<usize>;
}

/// SQLite-backed project store.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["projects", "notes"])?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        project.validate()?;
        if self.find_active_by_name(&project.name)?.is_some() {
            return Err(RepoError::DuplicateProjectName(project.name.clone()));
        }

        let inserted = self.conn.execute(
            "INSERT INTO projects (id, name, description, color, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                project.id.to_string(),
                project.name.as_str(),
                project.description.as_deref(),
                project.color.as_str(),
                i64::from(project.is_active),
            ],
        );

        match inserted {
            Ok(_) => Ok(project.id),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::DuplicateProjectName(project.name.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let parsed = stmt
            .query_row([id.to_string()], |row| Ok(parse_project_row(row)))
            .optional()?;
        parsed.transpose()
    }

    fn find_active_by_name(&self, name: &str) -> RepoResult<Option<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE is_active = 1
               AND name = ?1 COLLATE NOCASE;"
        ))?;
        let parsed = stmt
            .query_row([name.trim()], |row| Ok(parse_project_row(row)))
            .optional()?;
        parsed.transpose()
    }

    fn list_active_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE is_active = 1
             ORDER BY name COLLATE NOCASE ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn fallback_project(&self) -> RepoResult<Project> {
        self.get_project(FALLBACK_PROJECT_ID)?
            .ok_or(RepoError::NotFound {
                entity: "project",
                id: FALLBACK_PROJECT_ID,
            })
    }

    fn soft_delete_project(&self, id: ProjectId) -> RepoResult<usize> {
        if id == FALLBACK_PROJECT_ID {
            return Err(RepoError::FallbackProjectProtected);
        }

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE projects SET is_active = 0 WHERE id = ?1 AND is_active = 1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id,
            });
        }
        let reassigned = tx.execute(
            "UPDATE notes SET project_id = ?1 WHERE project_id = ?2;",
            params![FALLBACK_PROJECT_ID.to_string(), id.to_string()],
        )?;
        tx.commit()?;

        info!(
            "event=project_delete module=repo status=ok project_id={} reassigned_notes={}",
            id, reassigned
        );
        Ok(reassigned)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("id")?;
    let is_active = match row.get::<_, i64>("is_active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_active value `{other}` in projects.is_active"
            )));
        }
    };

    Ok(Project {
        id: parse_uuid(&id_text, "projects.id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        is_active,
    })
}
