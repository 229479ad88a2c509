//! Note store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist captured notes with their extracted entities.
//! - Provide the full note list consumed by relevance scoring.
//!
//! # Invariants
//! - Notes are immutable once inserted.
//! - Listing order is `created_at DESC, id ASC`.
//! - Malformed entity JSON is read as an empty bag, never as an error.

use super::{ensure_tables, parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use crate::model::note::{EntityBag, Note, NoteId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    text,
    word_count,
    project_id,
    entities,
    created_at
FROM notes";

/// Repository interface for note persistence.
pub trait NoteRepository {
    /// Inserts one note and returns its stable id.
    fn create_note(&self, note: &Note) -> RepoResult<NoteId>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Returns every note, newest first.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    fn count_notes(&self) -> RepoResult<u64>;
}

/// SQLite-backed note store.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notes"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;
        let entities = serde_json::to_string(&note.entities).map_err(|err| {
            RepoError::InvalidData(format!("failed to encode note entities: {err}"))
        })?;

        self.conn.execute(
            "INSERT INTO notes (
                id,
                text,
                word_count,
                project_id,
                entities,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                note.id.to_string(),
                note.text.as_str(),
                note.word_count,
                note.project_id.map(|id| id.to_string()),
                entities,
                note.created_at,
            ],
        )?;

        Ok(note.id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let parsed = stmt
            .query_row([id.to_string()], |row| Ok(parse_note_row(row)))
            .optional()?;
        parsed.transpose()
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} ORDER BY created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn count_notes(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative note count `{count}`")))
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let entities_text: String = row.get("entities")?;
    let word_count: i64 = row.get("word_count")?;

    Ok(Note {
        id: parse_uuid(&id_text, "notes.id")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
        word_count: u32::try_from(word_count).map_err(|_| {
            RepoError::InvalidData(format!("invalid word_count `{word_count}` in notes"))
        })?,
        project_id: parse_optional_uuid(row.get("project_id")?, "notes.project_id")?,
        entities: EntityBag::from_json_str(&entities_text),
    })
}
