//! Core domain logic for the voice-memo notebook.
//!
//! The engine (`engine`) holds the only nontrivial decision logic: relevance
//! ranking of notes against a question, leading project detection, and task
//! completion matching. Everything else wires it to storage and to external
//! language-model collaborators.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{
    load_config, parse_config, ConfigError, ContextBudget, EngineConfig, MatcherConfig,
};
pub use engine::project_classifier::{classify_project, ProjectMatch};
pub use engine::relevance::{
    rank_notes, render_note_line, select_relevant_context, select_relevant_context_with,
    ContextSelection, QueryTerms, ScoredNote,
};
pub use engine::task_matcher::{
    detect_completion_keywords, match_task_completions, required_overlap, COMPLETION_KEYWORDS,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{EntityBag, EntityCategory, Note, NoteId};
pub use model::project::{
    Project, ProjectId, DEFAULT_PROJECT_COLOR, FALLBACK_PROJECT_ID, FALLBACK_PROJECT_NAME,
};
pub use model::task::{
    CompletionCandidate, CompletionSuggestion, SuggestionId, SuggestionStatus, Task, TaskId,
    TaskStatus,
};
pub use model::ValidationError;
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::write_scope::{SqliteWriteScope, WriteScope};
pub use repo::{RepoError, RepoResult};
pub use service::ask_service::{AskOutcome, AskService, NO_NOTES_ANSWER};
pub use service::capture_service::{CaptureOutcome, CaptureService};
pub use service::external::{
    AnswerComposer, EntityExtractor, ExternalServiceError, NoopEntityExtractor,
};
pub use service::project_service::ProjectService;
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for integration smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
