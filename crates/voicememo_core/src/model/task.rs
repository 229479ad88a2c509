//! Task lifecycle and completion-candidate models.
//!
//! # Invariants
//! - Status only moves `pending -> completed`, never backward.
//! - `completed_by` references a note that exists and does not predate the
//!   originating note (enforced by the task registry).

use super::note::NoteId;
use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;
pub type SuggestionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Note whose extracted entities produced this task.
    pub note_id: NoteId,
    pub description: String,
    pub status: TaskStatus,
    pub completed_by: Option<NoteId>,
    /// Unix epoch milliseconds.
    pub completed_at: Option<i64>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Task {
    /// Creates a pending task originating from `note_id`.
    pub fn new(note_id: NoteId, description: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            note_id,
            description: description.into().trim().to_string(),
            status: TaskStatus::Pending,
            completed_by: None,
            completed_at: None,
            created_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyTaskDescription);
        }
        let completed = self.status == TaskStatus::Completed;
        if completed != self.completed_by.is_some() || completed != self.completed_at.is_some() {
            return Err(ValidationError::CompletionFieldsMismatch);
        }
        Ok(())
    }
}

/// Proposed pairing of a note with a pending task it may complete.
///
/// Produced by the task matcher; `note_id` is filled once the note is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionCandidate {
    pub task_id: TaskId,
    pub note_id: Option<NoteId>,
    /// Task description words found in the note text, in description order.
    pub matched_words: Vec<String>,
    /// Matched word ratio in `[0, 1]`.
    pub confidence: f64,
}

impl CompletionCandidate {
    pub fn for_note(mut self, note_id: NoteId) -> Self {
        self.note_id = Some(note_id);
        self
    }
}

/// Review state of a persisted completion suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Open,
    Confirmed,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(Self::Open),
            "confirmed" => Some(Self::Confirmed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Completion candidate held for user confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSuggestion {
    pub id: SuggestionId,
    pub task_id: TaskId,
    pub note_id: NoteId,
    pub matched_words: Vec<String>,
    pub confidence: f64,
    pub status: SuggestionStatus,
    pub created_at: i64,
}

impl CompletionSuggestion {
    /// Opens a suggestion pairing `note_id` with the candidate's task.
    pub fn from_candidate(
        candidate: &CompletionCandidate,
        note_id: NoteId,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: candidate.task_id,
            note_id,
            matched_words: candidate.matched_words.clone(),
            confidence: candidate.confidence,
            status: SuggestionStatus::Open,
            created_at,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError::ConfidenceOutOfRange);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskStatus};
    use uuid::Uuid;

    #[test]
    fn new_task_is_pending_and_valid() {
        let task = Task::new(Uuid::new_v4(), " call Sarah ", 10);
        assert!(task.is_pending());
        assert_eq!(task.description, "call Sarah");
        assert!(task.validate().is_ok());
    }

    #[test]
    fn completed_task_requires_completion_fields() {
        let mut task = Task::new(Uuid::new_v4(), "call Sarah", 10);
        task.status = TaskStatus::Completed;
        assert!(task.validate().is_err());

        task.completed_by = Some(Uuid::new_v4());
        task.completed_at = Some(20);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn status_round_trips_through_db_text() {
        for status in [TaskStatus::Pending, TaskStatus::Completed] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("done"), None);
    }
}
