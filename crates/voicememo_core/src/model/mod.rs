//! Domain model for captured notes, projects and tasks.
//!
//! # Responsibility
//! - Define canonical records consumed by the engine and persisted by repos.
//! - Keep entity extraction output in a fixed, typed shape.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Projects are soft-deleted via `is_active`, never hard-deleted.
//! - Tasks move `pending -> completed` at most once.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note;
pub mod project;
pub mod task;

/// Validation failures for domain records before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyNoteText,
    EmptyProjectName,
    EmptyTaskDescription,
    /// `completed_by`/`completed_at` must be set exactly when status is `completed`.
    CompletionFieldsMismatch,
    ConfidenceOutOfRange,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyNoteText => write!(f, "note text cannot be empty"),
            Self::EmptyProjectName => write!(f, "project name cannot be empty"),
            Self::EmptyTaskDescription => write!(f, "task description cannot be empty"),
            Self::CompletionFieldsMismatch => write!(
                f,
                "completed_by/completed_at must be set only for completed tasks"
            ),
            Self::ConfidenceOutOfRange => write!(f, "confidence must be within [0, 1]"),
        }
    }
}

impl Error for ValidationError {}
