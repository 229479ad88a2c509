//! Task registry contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own task lifecycle state (`pending` / `completed`).
//! - Hold completion suggestions awaiting confirmation.
//!
//! # Invariants
//! - `pending -> completed` is one conditional `UPDATE ... WHERE status =
//!   'pending'`; concurrent completions of the same task see exactly one
//!   winner.
//! - The completing note must exist and must not predate the task's
//!   originating note.
//! - A task/note pair is suggested at most once, so a rejected suggestion is
//!   never retried.

use super::{ensure_tables, parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use crate::model::note::NoteId;
use crate::model::task::{
    CompletionSuggestion, SuggestionId, SuggestionStatus, Task, TaskId, TaskStatus,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    note_id,
    description,
    status,
    completed_by,
    completed_at,
    created_at
FROM tasks";

const SUGGESTION_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    note_id,
    confidence,
    matched_words,
    status,
    created_at
FROM task_suggestions";

/// Repository interface for task lifecycle state.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Pending tasks, oldest first.
    fn list_pending_tasks(&self) -> RepoResult<Vec<Task>>;
    /// Atomically moves a pending task to `completed`.
    fn complete_task(
        &self,
        task_id: TaskId,
        completing_note_id: NoteId,
        completed_at: i64,
    ) -> RepoResult<Task>;
    /// Stores an open suggestion; returns `false` when the pair already exists.
    fn record_suggestion(&self, suggestion: &CompletionSuggestion) -> RepoResult<bool>;
    fn get_suggestion(&self, id: SuggestionId) -> RepoResult<Option<CompletionSuggestion>>;
    /// Open suggestions, highest confidence first.
    fn list_open_suggestions(&self) -> RepoResult<Vec<CompletionSuggestion>>;
    /// Accepts an open suggestion and completes its task.
    fn confirm_suggestion(&self, id: SuggestionId, completed_at: i64) -> RepoResult<Task>;
    /// Rejects an open suggestion; the task stays pending.
    fn reject_suggestion(&self, id: SuggestionId) -> RepoResult<()>;
}

/// SQLite-backed task registry.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["tasks", "task_suggestions", "notes"])?;
        Ok(Self { conn })
    }

    fn diagnose_failed_completion(&self, task_id: TaskId, note_id: NoteId) -> RepoError {
        match self.get_task(task_id) {
            Ok(None) => RepoError::NotFound {
                entity: "task",
                id: task_id,
            },
            Ok(Some(task)) if task.status == TaskStatus::Completed => {
                RepoError::TaskAlreadyCompleted(task_id)
            }
            Ok(Some(_)) => RepoError::InvalidCompletion { task_id, note_id },
            Err(err) => err,
        }
    }

    fn suggestion_closed_or_missing(&self, id: SuggestionId) -> RepoError {
        match self.get_suggestion(id) {
            Ok(None) => RepoError::NotFound {
                entity: "suggestion",
                id,
            },
            Ok(Some(_)) => RepoError::SuggestionClosed(id),
            Err(err) => err,
        }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;
        self.conn.execute(
            "INSERT INTO tasks (
                id,
                note_id,
                description,
                status,
                completed_by,
                completed_at,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                task.id.to_string(),
                task.note_id.to_string(),
                task.description.as_str(),
                task.status.as_str(),
                task.completed_by.map(|id| id.to_string()),
                task.completed_at,
                task.created_at,
            ],
        )?;
        Ok(task.id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let parsed = stmt
            .query_row([id.to_string()], |row| Ok(parse_task_row(row)))
            .optional()?;
        parsed.transpose()
    }

    fn list_pending_tasks(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE status = 'pending'
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn complete_task(
        &self,
        task_id: TaskId,
        completing_note_id: NoteId,
        completed_at: i64,
    ) -> RepoResult<Task> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                status = 'completed',
                completed_by = ?2,
                completed_at = ?3
             WHERE id = ?1
               AND status = 'pending'
               AND EXISTS (
                    SELECT 1
                    FROM notes completing
                    INNER JOIN notes origin ON origin.id = tasks.note_id
                    WHERE completing.id = ?2
                      AND completing.created_at >= origin.created_at
               );",
            params![
                task_id.to_string(),
                completing_note_id.to_string(),
                completed_at
            ],
        )?;

        if changed == 0 {
            return Err(self.diagnose_failed_completion(task_id, completing_note_id));
        }

        info!(
            "event=task_complete module=repo status=ok task_id={} note_id={}",
            task_id, completing_note_id
        );
        self.get_task(task_id)?.ok_or(RepoError::NotFound {
            entity: "task",
            id: task_id,
        })
    }

    fn record_suggestion(&self, suggestion: &CompletionSuggestion) -> RepoResult<bool> {
        suggestion.validate()?;
        let matched_words = serde_json::to_string(&suggestion.matched_words).map_err(|err| {
            RepoError::InvalidData(format!("failed to encode matched words: {err}"))
        })?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO task_suggestions (
                id,
                task_id,
                note_id,
                confidence,
                matched_words,
                status,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                suggestion.id.to_string(),
                suggestion.task_id.to_string(),
                suggestion.note_id.to_string(),
                suggestion.confidence,
                matched_words,
                suggestion.status.as_str(),
                suggestion.created_at,
            ],
        )?;
        Ok(inserted == 1)
    }

    fn get_suggestion(&self, id: SuggestionId) -> RepoResult<Option<CompletionSuggestion>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUGGESTION_SELECT_SQL} WHERE id = ?1;"))?;
        let parsed = stmt
            .query_row([id.to_string()], |row| Ok(parse_suggestion_row(row)))
            .optional()?;
        parsed.transpose()
    }

    fn list_open_suggestions(&self) -> RepoResult<Vec<CompletionSuggestion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUGGESTION_SELECT_SQL}
             WHERE status = 'open'
             ORDER BY confidence DESC, created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut suggestions = Vec::new();
        while let Some(row) = rows.next()? {
            suggestions.push(parse_suggestion_row(row)?);
        }
        Ok(suggestions)
    }

    fn confirm_suggestion(&self, id: SuggestionId, completed_at: i64) -> RepoResult<Task> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE task_suggestions SET status = 'confirmed' WHERE id = ?1 AND status = 'open';",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(self.suggestion_closed_or_missing(id));
        }

        let (task_id, note_id) = tx.query_row(
            "SELECT task_id, note_id FROM task_suggestions WHERE id = ?1;",
            [id.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )?;
        let task_id = parse_uuid(&task_id, "task_suggestions.task_id")?;
        let note_id = parse_uuid(&note_id, "task_suggestions.note_id")?;

        // Runs inside `tx`; a failed completion rolls the suggestion back to open.
        let task = self.complete_task(task_id, note_id, completed_at)?;
        tx.commit()?;
        Ok(task)
    }

    fn reject_suggestion(&self, id: SuggestionId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE task_suggestions SET status = 'rejected' WHERE id = ?1 AND status = 'open';",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(self.suggestion_closed_or_missing(id));
        }
        info!(
            "event=suggestion_reject module=repo status=ok suggestion_id={}",
            id
        );
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let note_id_text: String = row.get("note_id")?;
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let task = Task {
        id: parse_uuid(&id_text, "tasks.id")?,
        note_id: parse_uuid(&note_id_text, "tasks.note_id")?,
        description: row.get("description")?,
        status,
        completed_by: parse_optional_uuid(row.get("completed_by")?, "tasks.completed_by")?,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
    };
    task.validate()?;
    Ok(task)
}

fn parse_suggestion_row(row: &Row<'_>) -> RepoResult<CompletionSuggestion> {
    let id_text: String = row.get("id")?;
    let task_id_text: String = row.get("task_id")?;
    let note_id_text: String = row.get("note_id")?;
    let status_text: String = row.get("status")?;
    let matched_words_text: String = row.get("matched_words")?;

    let status = SuggestionStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid suggestion status `{status_text}` in task_suggestions.status"
        ))
    })?;
    let matched_words = serde_json::from_str::<Vec<String>>(&matched_words_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid matched_words `{matched_words_text}` in task_suggestions"
        ))
    })?;

    Ok(CompletionSuggestion {
        id: parse_uuid(&id_text, "task_suggestions.id")?,
        task_id: parse_uuid(&task_id_text, "task_suggestions.task_id")?,
        note_id: parse_uuid(&note_id_text, "task_suggestions.note_id")?,
        matched_words,
        confidence: row.get("confidence")?,
        status,
        created_at: row.get("created_at")?,
    })
}
