//! Question answering use-case.
//!
//! # Responsibility
//! - Select a bounded, relevance-ranked context from all stored notes.
//! - Hand question and context to the answer composer.
//!
//! # Invariants
//! - The composer is never called when no notes exist.
//! - A blank question is answered from the recency fallback, not rejected.
//! - The composer never receives more than `ContextBudget::max_chars`
//!   characters of context.

use crate::config::ContextBudget;
use crate::engine::relevance::{select_relevant_context_with, ContextSelection};
use crate::repo::note_repo::NoteRepository;
use crate::service::external::AnswerComposer;
use crate::service::ServiceResult;
use chrono::Utc;
use log::info;

/// Answer returned when the note history is empty.
pub const NO_NOTES_ANSWER: &str = "No notes have been recorded yet.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOutcome {
    pub answer: String,
    /// Notes included in the context.
    pub used_count: usize,
    /// Notes available in the store.
    pub total_count: usize,
}

impl AskOutcome {
    /// Caller-facing disclosure, e.g. `searched 3 of 40 notes`.
    pub fn disclosure(&self) -> String {
        format!("searched {} of {} notes", self.used_count, self.total_count)
    }
}

pub struct AskService<N: NoteRepository, C: AnswerComposer> {
    notes: N,
    composer: C,
    budget: ContextBudget,
}

impl<N: NoteRepository, C: AnswerComposer> AskService<N, C> {
    pub fn new(notes: N, composer: C, budget: ContextBudget) -> Self {
        Self {
            notes,
            composer,
            budget,
        }
    }

    /// Answers `question` at the current time.
    pub fn ask(&self, question: &str) -> ServiceResult<AskOutcome> {
        self.ask_at(question, Utc::now().timestamp_millis())
    }

    pub fn ask_at(&self, question: &str, now_ms: i64) -> ServiceResult<AskOutcome> {
        // Blank questions score nothing and select the most recent notes.
        let question = question.trim();
        let selection = self.select_context_at(question, now_ms)?;
        if selection.total_count == 0 {
            return Ok(AskOutcome {
                answer: NO_NOTES_ANSWER.to_string(),
                used_count: 0,
                total_count: 0,
            });
        }

        let answer = self
            .composer
            .compose(question, &selection.rendered_context)?;
        info!(
            "event=ask module=service status=ok used={} total={} context_chars={}",
            selection.used_count,
            selection.total_count,
            selection.rendered_context.chars().count()
        );

        Ok(AskOutcome {
            answer,
            used_count: selection.used_count,
            total_count: selection.total_count,
        })
    }

    /// Loads all notes and selects context without composing an answer.
    pub fn select_context_at(
        &self,
        question: &str,
        now_ms: i64,
    ) -> ServiceResult<ContextSelection> {
        let notes = self.notes.list_notes()?;
        Ok(select_relevant_context_with(
            question,
            &notes,
            &self.budget,
            now_ms,
        ))
    }
}
