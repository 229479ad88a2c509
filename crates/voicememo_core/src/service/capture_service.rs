//! Note capture use-case.
//!
//! # Responsibility
//! - Turn raw transcribed text into a stored note: project detection,
//!   entity extraction, task creation and completion matching.
//! - Apply the auto-complete vs. confirm policy to completion candidates.
//!
//! # Invariants
//! - Extraction failures never block capture; the note is stored without
//!   entities.
//! - Tasks created from a note are never matched against that same note.
//! - Notes without a detected project are assigned the fallback project.
//! - The note, its tasks and its completion effects are written in one
//!   transaction; a failed capture leaves nothing behind.

use crate::config::MatcherConfig;
use crate::engine::project_classifier::classify_project;
use crate::engine::task_matcher::{detect_completion_keywords, match_task_completions};
use crate::model::note::{EntityBag, Note};
use crate::model::project::Project;
use crate::model::task::{CompletionSuggestion, Task, TaskId};
use crate::repo::note_repo::NoteRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::write_scope::WriteScope;
use crate::repo::RepoError;
use crate::service::external::EntityExtractor;
use crate::service::{ServiceError, ServiceResult};
use chrono::Utc;
use log::{info, warn};

/// Everything a capture produced, for reporting back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub note: Note,
    pub project: Project,
    /// Whether the project came from a leading reference in the text.
    pub project_detected: bool,
    pub created_tasks: Vec<Task>,
    pub completion_keywords: Vec<&'static str>,
    /// Tasks completed automatically by this note.
    pub auto_completed: Vec<Task>,
    /// Candidates below the auto-complete threshold, held for review.
    pub suggestions: Vec<CompletionSuggestion>,
    /// Auto-complete candidates that another writer completed first.
    pub already_completed: Vec<TaskId>,
    pub extraction_failed: bool,
}

#[derive(Default)]
struct StoredCapture {
    created_tasks: Vec<Task>,
    auto_completed: Vec<Task>,
    suggestions: Vec<CompletionSuggestion>,
    already_completed: Vec<TaskId>,
}

pub struct CaptureService<N, P, T, E, S>
where
    N: NoteRepository,
    P: ProjectRepository,
    T: TaskRepository,
    E: EntityExtractor,
    S: WriteScope,
{
    notes: N,
    projects: P,
    tasks: T,
    extractor: E,
    scope: S,
    matcher: MatcherConfig,
}

impl<N, P, T, E, S> CaptureService<N, P, T, E, S>
where
    N: NoteRepository,
    P: ProjectRepository,
    T: TaskRepository,
    E: EntityExtractor,
    S: WriteScope,
{
    /// `scope` must cover the connection the three repositories write to.
    pub fn new(
        notes: N,
        projects: P,
        tasks: T,
        extractor: E,
        scope: S,
        matcher: MatcherConfig,
    ) -> Self {
        Self {
            notes,
            projects,
            tasks,
            extractor,
            scope,
            matcher,
        }
    }

    /// Captures one note at the current time.
    pub fn capture_note(&self, text: &str) -> ServiceResult<CaptureOutcome> {
        self.capture_note_at(text, Utc::now().timestamp_millis())
    }

    /// Captures one note with an explicit creation time (epoch milliseconds).
    pub fn capture_note_at(&self, text: &str, now_ms: i64) -> ServiceResult<CaptureOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::EmptyInput("note text"));
        }

        let (project, body, project_detected) = self.resolve_project(text)?;

        let (entities, extraction_failed) = match self.extractor.extract(&body) {
            Ok(entities) => (entities, false),
            Err(err) => {
                warn!(
                    "event=entity_extract module=service status=error service={} error={}",
                    err.service, err.message
                );
                (EntityBag::default(), true)
            }
        };

        let note = Note::new(body, now_ms)
            .with_project(project.id)
            .with_entities(entities);
        let completion_keywords = detect_completion_keywords(&note.text);
        let stored = self.scope.atomically(|| self.store_note(&note, now_ms))?;

        info!(
            "event=note_capture module=service status=ok note_id={} project_detected={} words={} tasks_created={} auto_completed={} suggestions={} extraction_failed={}",
            note.id,
            project_detected,
            note.word_count,
            stored.created_tasks.len(),
            stored.auto_completed.len(),
            stored.suggestions.len(),
            extraction_failed
        );

        Ok(CaptureOutcome {
            note,
            project,
            project_detected,
            created_tasks: stored.created_tasks,
            completion_keywords,
            auto_completed: stored.auto_completed,
            suggestions: stored.suggestions,
            already_completed: stored.already_completed,
            extraction_failed,
        })
    }

    /// Writes the note, its tasks and its completion effects.
    fn store_note(&self, note: &Note, now_ms: i64) -> ServiceResult<StoredCapture> {
        // Read before inserting this note's own tasks.
        let pending = self.tasks.list_pending_tasks()?;
        self.notes.create_note(note)?;

        let mut stored = StoredCapture {
            created_tasks: self.create_tasks_from_entities(note, now_ms)?,
            ..StoredCapture::default()
        };

        for candidate in match_task_completions(&note.text, &pending) {
            let candidate = candidate.for_note(note.id);
            if candidate.confidence >= self.matcher.auto_complete_confidence {
                match self.tasks.complete_task(candidate.task_id, note.id, now_ms) {
                    Ok(task) => stored.auto_completed.push(task),
                    Err(RepoError::TaskAlreadyCompleted(task_id)) => {
                        stored.already_completed.push(task_id)
                    }
                    Err(err) => return Err(err.into()),
                }
                continue;
            }

            let suggestion = CompletionSuggestion::from_candidate(&candidate, note.id, now_ms);
            if self.tasks.record_suggestion(&suggestion)? {
                stored.suggestions.push(suggestion);
            }
        }
        Ok(stored)
    }

    fn resolve_project(&self, text: &str) -> ServiceResult<(Project, String, bool)> {
        let active = self.projects.list_active_projects()?;
        let names = active
            .iter()
            .map(|project| project.name.as_str())
            .collect::<Vec<_>>();

        if let Some(found) = classify_project(text, &names) {
            if let Some(project) = active
                .iter()
                .find(|project| project.name.trim() == found.project)
            {
                return Ok((project.clone(), found.stripped_text, true));
            }
        }

        let fallback = self.projects.fallback_project()?;
        Ok((fallback, text.to_string(), false))
    }

    fn create_tasks_from_entities(&self, note: &Note, now_ms: i64) -> ServiceResult<Vec<Task>> {
        let mut created: Vec<Task> = Vec::new();
        for description in &note.entities.tasks {
            let description = description.trim();
            if description.is_empty()
                || created
                    .iter()
                    .any(|task| task.description.eq_ignore_ascii_case(description))
            {
                continue;
            }
            let task = Task::new(note.id, description, now_ms);
            self.tasks.create_task(&task)?;
            created.push(task);
        }
        Ok(created)
    }
}
