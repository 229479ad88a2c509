use std::cell::RefCell;
use std::collections::HashMap;
use voicememo_core::db::open_db_in_memory;
use voicememo_core::{
    AnswerComposer, AskService, CaptureService, CompletionSuggestion, ContextBudget, EntityBag,
    EntityExtractor, ExternalServiceError, MatcherConfig, NoteId, NoteRepository, Project,
    ProjectRepository, RepoError, RepoResult, ServiceError, SqliteNoteRepository,
    SqliteProjectRepository, SqliteTaskRepository, SqliteWriteScope, SuggestionId, Task, TaskId,
    TaskRepository, TaskStatus, FALLBACK_PROJECT_ID, NO_NOTES_ANSWER,
};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const NOW: i64 = 1_760_000_000_000;

/// Returns canned task entities keyed by the text it receives.
#[derive(Default)]
struct TaskExtractor {
    tasks_by_text: HashMap<String, Vec<String>>,
}

impl TaskExtractor {
    fn with(mut self, text: &str, tasks: &[&str]) -> Self {
        self.tasks_by_text.insert(
            text.to_string(),
            tasks.iter().map(|task| task.to_string()).collect(),
        );
        self
    }
}

impl EntityExtractor for TaskExtractor {
    fn extract(&self, text: &str) -> Result<EntityBag, ExternalServiceError> {
        Ok(EntityBag {
            tasks: self.tasks_by_text.get(text).cloned().unwrap_or_default(),
            ..EntityBag::default()
        })
    }
}

struct FailingExtractor;

impl EntityExtractor for FailingExtractor {
    fn extract(&self, _text: &str) -> Result<EntityBag, ExternalServiceError> {
        Err(ExternalServiceError::new("entity_extractor", "timeout"))
    }
}

#[derive(Default)]
struct RecordingComposer {
    calls: RefCell<Vec<(String, String)>>,
    fail: bool,
}

impl AnswerComposer for &RecordingComposer {
    fn compose(&self, question: &str, context: &str) -> Result<String, ExternalServiceError> {
        if self.fail {
            return Err(ExternalServiceError::new("answer_composer", "unavailable"));
        }
        self.calls
            .borrow_mut()
            .push((question.to_string(), context.to_string()));
        Ok(format!("answer for {question}"))
    }
}

fn capture_service<E: EntityExtractor>(
    conn: &rusqlite::Connection,
    extractor: E,
) -> CaptureService<
    SqliteNoteRepository<'_>,
    SqliteProjectRepository<'_>,
    SqliteTaskRepository<'_>,
    E,
    SqliteWriteScope<'_>,
> {
    CaptureService::new(
        SqliteNoteRepository::try_new(conn).unwrap(),
        SqliteProjectRepository::try_new(conn).unwrap(),
        SqliteTaskRepository::try_new(conn).unwrap(),
        extractor,
        SqliteWriteScope::new(conn),
        MatcherConfig::default(),
    )
}

/// Task registry whose suggestion store is unavailable.
struct SuggestionsOffline<'conn> {
    inner: SqliteTaskRepository<'conn>,
}

impl TaskRepository for SuggestionsOffline<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        self.inner.create_task(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.inner.get_task(id)
    }

    fn list_pending_tasks(&self) -> RepoResult<Vec<Task>> {
        self.inner.list_pending_tasks()
    }

    fn complete_task(
        &self,
        task_id: TaskId,
        completing_note_id: NoteId,
        completed_at: i64,
    ) -> RepoResult<Task> {
        self.inner
            .complete_task(task_id, completing_note_id, completed_at)
    }

    fn record_suggestion(&self, _suggestion: &CompletionSuggestion) -> RepoResult<bool> {
        Err(RepoError::InvalidData("suggestion store offline".to_string()))
    }

    fn get_suggestion(&self, id: SuggestionId) -> RepoResult<Option<CompletionSuggestion>> {
        self.inner.get_suggestion(id)
    }

    fn list_open_suggestions(&self) -> RepoResult<Vec<CompletionSuggestion>> {
        self.inner.list_open_suggestions()
    }

    fn confirm_suggestion(&self, id: SuggestionId, completed_at: i64) -> RepoResult<Task> {
        self.inner.confirm_suggestion(id, completed_at)
    }

    fn reject_suggestion(&self, id: SuggestionId) -> RepoResult<()> {
        self.inner.reject_suggestion(id)
    }
}

#[test]
fn leading_project_reference_is_detected_and_stripped() {
    let conn = open_db_in_memory().unwrap();
    let work = Project::new("Work");
    SqliteProjectRepository::try_new(&conn)
        .unwrap()
        .create_project(&work)
        .unwrap();
    let service = capture_service(&conn, TaskExtractor::default());

    let outcome = service
        .capture_note_at("work: moved the standup to ten", NOW)
        .unwrap();
    assert!(outcome.project_detected);
    assert_eq!(outcome.project.id, work.id);
    assert_eq!(outcome.note.text, "moved the standup to ten");
    assert_eq!(outcome.note.project_id, Some(work.id));

    let stored = SqliteNoteRepository::try_new(&conn)
        .unwrap()
        .get_note(outcome.note.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.text, "moved the standup to ten");
    assert_eq!(stored.word_count, 5);
}

#[test]
fn notes_without_project_reference_use_fallback_project() {
    let conn = open_db_in_memory().unwrap();
    let service = capture_service(&conn, TaskExtractor::default());

    let outcome = service
        .capture_note_at("Meeting notes: budget review", NOW)
        .unwrap();
    assert!(!outcome.project_detected);
    assert_eq!(outcome.project.id, FALLBACK_PROJECT_ID);
    assert_eq!(outcome.note.text, "Meeting notes: budget review");
}

#[test]
fn deleted_project_is_no_longer_detected() {
    let conn = open_db_in_memory().unwrap();
    let projects = SqliteProjectRepository::try_new(&conn).unwrap();
    let home = Project::new("Home");
    projects.create_project(&home).unwrap();
    projects.soft_delete_project(home.id).unwrap();
    let service = capture_service(&conn, TaskExtractor::default());

    let outcome = service.capture_note_at("Home: fix the sink", NOW).unwrap();
    assert!(!outcome.project_detected);
    assert_eq!(outcome.project.id, FALLBACK_PROJECT_ID);
    assert_eq!(outcome.note.text, "Home: fix the sink");
}

#[test]
fn full_match_auto_completes_pending_task() {
    let conn = open_db_in_memory().unwrap();
    let extractor = TaskExtractor::default().with("Remember to call Sarah", &["call Sarah"]);
    let service = capture_service(&conn, extractor);

    let first = service
        .capture_note_at("Remember to call Sarah", NOW - DAY_MS)
        .unwrap();
    assert_eq!(first.created_tasks.len(), 1);
    let task_id = first.created_tasks[0].id;

    let second = service
        .capture_note_at("Called Sarah about the proposal", NOW)
        .unwrap();
    assert_eq!(second.completion_keywords, vec!["called"]);
    assert_eq!(second.auto_completed.len(), 1);
    assert_eq!(second.auto_completed[0].id, task_id);
    assert!(second.suggestions.is_empty());

    let task = SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .get_task(task_id)
        .unwrap()
        .unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.completed_by, Some(second.note.id));
}

#[test]
fn partial_match_is_held_as_suggestion() {
    let conn = open_db_in_memory().unwrap();
    let extractor =
        TaskExtractor::default().with("Need to book flights to Denver", &["book flights to Denver"]);
    let service = capture_service(&conn, extractor);

    let first = service
        .capture_note_at("Need to book flights to Denver", NOW - DAY_MS)
        .unwrap();
    let task_id = first.created_tasks[0].id;

    let second = service
        .capture_note_at("Booked flights already", NOW)
        .unwrap();
    assert!(second.auto_completed.is_empty());
    assert_eq!(second.suggestions.len(), 1);
    assert_eq!(second.suggestions[0].task_id, task_id);
    assert_eq!(second.suggestions[0].note_id, second.note.id);
    assert!((second.suggestions[0].confidence - 2.0 / 3.0).abs() < 1e-9);

    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    assert!(tasks.get_task(task_id).unwrap().unwrap().is_pending());
    assert_eq!(tasks.list_open_suggestions().unwrap().len(), 1);
}

#[test]
fn tasks_are_never_completed_by_their_own_note() {
    let conn = open_db_in_memory().unwrap();
    let text = "Called the bank, still need to call Sarah";
    let extractor = TaskExtractor::default().with(text, &["call Sarah", "Call Sarah"]);
    let service = capture_service(&conn, extractor);

    let outcome = service.capture_note_at(text, NOW).unwrap();
    assert_eq!(outcome.created_tasks.len(), 1);
    assert!(outcome.auto_completed.is_empty());
    assert!(outcome.suggestions.is_empty());
    assert!(outcome.created_tasks[0].is_pending());
}

#[test]
fn failed_capture_leaves_no_partial_writes() {
    let conn = open_db_in_memory().unwrap();
    let first_text = "Need to book flights to Denver";
    capture_service(
        &conn,
        TaskExtractor::default().with(first_text, &["book flights to Denver"]),
    )
    .capture_note_at(first_text, NOW - DAY_MS)
    .unwrap();

    let second_text = "Booked flights already, still need to pack";
    let extractor = TaskExtractor::default().with(second_text, &["pack"]);
    let offline = CaptureService::new(
        SqliteNoteRepository::try_new(&conn).unwrap(),
        SqliteProjectRepository::try_new(&conn).unwrap(),
        SuggestionsOffline {
            inner: SqliteTaskRepository::try_new(&conn).unwrap(),
        },
        extractor,
        SqliteWriteScope::new(&conn),
        MatcherConfig::default(),
    );
    let err = offline.capture_note_at(second_text, NOW).unwrap_err();
    assert!(matches!(err, ServiceError::Repo(RepoError::InvalidData(_))));

    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    assert_eq!(notes.count_notes().unwrap(), 1);
    assert_eq!(tasks.list_pending_tasks().unwrap().len(), 1);

    let retried = capture_service(
        &conn,
        TaskExtractor::default().with(second_text, &["pack"]),
    )
    .capture_note_at(second_text, NOW)
    .unwrap();
    assert_eq!(retried.suggestions.len(), 1);
    assert_eq!(retried.created_tasks.len(), 1);
    assert_eq!(notes.count_notes().unwrap(), 2);
    assert_eq!(tasks.list_pending_tasks().unwrap().len(), 2);
}

#[test]
fn extraction_failure_still_stores_note() {
    let conn = open_db_in_memory().unwrap();
    let service = capture_service(&conn, FailingExtractor);

    let outcome = service.capture_note_at("Lunch with Priya", NOW).unwrap();
    assert!(outcome.extraction_failed);
    assert!(outcome.note.entities.is_empty());
    assert!(outcome.created_tasks.is_empty());
    assert_eq!(
        SqliteNoteRepository::try_new(&conn)
            .unwrap()
            .count_notes()
            .unwrap(),
        1
    );
}

#[test]
fn blank_note_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = capture_service(&conn, TaskExtractor::default());

    assert!(matches!(
        service.capture_note_at("   ", NOW),
        Err(ServiceError::EmptyInput(_))
    ));
}

#[test]
fn ask_without_notes_skips_composer() {
    let conn = open_db_in_memory().unwrap();
    let composer = RecordingComposer::default();
    let service = AskService::new(
        SqliteNoteRepository::try_new(&conn).unwrap(),
        &composer,
        ContextBudget::default(),
    );

    let outcome = service.ask_at("what did I do?", NOW).unwrap();
    assert_eq!(outcome.answer, NO_NOTES_ANSWER);
    assert_eq!(outcome.disclosure(), "searched 0 of 0 notes");
    assert!(composer.calls.borrow().is_empty());
}

#[test]
fn ask_passes_ranked_context_and_discloses_counts() {
    let conn = open_db_in_memory().unwrap();
    let capture = capture_service(&conn, TaskExtractor::default());
    capture
        .capture_note_at("Dentist appointment on Friday", NOW - 3 * DAY_MS)
        .unwrap();
    capture
        .capture_note_at("Groceries: eggs and bread", NOW - 10 * DAY_MS)
        .unwrap();

    let composer = RecordingComposer::default();
    let service = AskService::new(
        SqliteNoteRepository::try_new(&conn).unwrap(),
        &composer,
        ContextBudget::default(),
    );

    let outcome = service.ask_at("When is the dentist?", NOW).unwrap();
    assert_eq!(outcome.answer, "answer for When is the dentist?");
    assert_eq!(outcome.total_count, 2);
    assert_eq!(outcome.used_count, 1);
    assert_eq!(outcome.disclosure(), "searched 1 of 2 notes");

    let calls = composer.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.contains("Dentist appointment on Friday"));
    assert!(!calls[0].1.contains("Groceries"));
}

#[test]
fn ask_context_respects_character_budget() {
    let conn = open_db_in_memory().unwrap();
    let capture = capture_service(&conn, TaskExtractor::default());
    for offset in 0..20 {
        capture
            .capture_note_at(
                "Project status update with several words in it",
                NOW - offset * DAY_MS,
            )
            .unwrap();
    }

    let budget = ContextBudget {
        max_chars: 120,
        ..ContextBudget::default()
    };
    let composer = RecordingComposer::default();
    let service = AskService::new(
        SqliteNoteRepository::try_new(&conn).unwrap(),
        &composer,
        budget,
    );

    let outcome = service.ask_at("project status", NOW).unwrap();
    assert_eq!(outcome.total_count, 20);
    assert!(outcome.used_count >= 1);
    assert!(outcome.used_count < 20);

    let calls = composer.calls.borrow();
    assert!(calls[0].1.chars().count() <= 120);
}

#[test]
fn blank_question_uses_recent_notes() {
    let conn = open_db_in_memory().unwrap();
    let capture = capture_service(&conn, TaskExtractor::default());
    capture
        .capture_note_at("Paid the electric bill", NOW - 40 * DAY_MS)
        .unwrap();
    capture
        .capture_note_at("Walked to the farmers market", NOW - 30 * DAY_MS)
        .unwrap();

    let composer = RecordingComposer::default();
    let service = AskService::new(
        SqliteNoteRepository::try_new(&conn).unwrap(),
        &composer,
        ContextBudget::default(),
    );

    let outcome = service.ask_at("   ", NOW).unwrap();
    assert_eq!(outcome.used_count, 2);
    assert_eq!(outcome.total_count, 2);

    let calls = composer.calls.borrow();
    assert_eq!(calls[0].0, "");
    assert!(calls[0]
        .1
        .starts_with("[9/9/2025] Walked to the farmers market"));
}

#[test]
fn composer_failure_is_surfaced() {
    let conn = open_db_in_memory().unwrap();
    capture_service(&conn, TaskExtractor::default())
        .capture_note_at("Paid the electric bill", NOW)
        .unwrap();

    let composer = RecordingComposer {
        fail: true,
        ..RecordingComposer::default()
    };
    let service = AskService::new(
        SqliteNoteRepository::try_new(&conn).unwrap(),
        &composer,
        ContextBudget::default(),
    );

    assert!(matches!(
        service.ask_at("bills?", NOW),
        Err(ServiceError::External(_))
    ));
}
