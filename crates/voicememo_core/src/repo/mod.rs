//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for notes, projects and
//!   tasks.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate domain records before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, conflicts) in
//!   addition to DB transport errors.

use crate::db::DbError;
use crate::model::task::TaskId;
use crate::model::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod note_repo;
pub mod project_repo;
pub mod task_repo;
pub mod write_scope;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: Uuid,
    },
    InvalidData(String),
    MissingRequiredTable(&'static str),
    /// Another active project already uses this name (case-insensitive).
    DuplicateProjectName(String),
    /// The fallback project cannot be deleted.
    FallbackProjectProtected,
    TaskAlreadyCompleted(TaskId),
    /// Completing note is missing or predates the task's originating note.
    InvalidCompletion {
        task_id: TaskId,
        note_id: Uuid,
    },
    /// Suggestion was already confirmed or rejected.
    SuggestionClosed(Uuid),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
            Self::DuplicateProjectName(name) => {
                write!(f, "an active project named `{name}` already exists")
            }
            Self::FallbackProjectProtected => write!(f, "the fallback project cannot be deleted"),
            Self::TaskAlreadyCompleted(id) => write!(f, "task already completed: {id}"),
            Self::InvalidCompletion { task_id, note_id } => write!(
                f,
                "note {note_id} cannot complete task {task_id}: note missing or older than the task"
            ),
            Self::SuggestionClosed(id) => write!(f, "suggestion already resolved: {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_optional_uuid(value: Option<String>, column: &str) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}
