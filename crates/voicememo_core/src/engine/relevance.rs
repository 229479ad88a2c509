//! Question-to-note relevance scoring and context rendering.
//!
//! # Responsibility
//! - Score notes by keyword overlap, entity references and recency.
//! - Render the best notes into a bounded context string.
//!
//! # Invariants
//! - Rendered context never exceeds `ContextBudget::max_chars` characters.
//! - At most `ContextBudget::max_notes` notes are rendered.
//! - Notes are included whole or not at all.
//! - A non-empty note list never yields an empty ranking (recency fallback).

use crate::config::ContextBudget;
use crate::engine::text::significant_words;
use crate::model::note::Note;
use chrono::{DateTime, Utc};
use log::debug;
use std::cmp::Ordering;

const TERM_MATCH_SCORE: u32 = 10;
const ENTITY_MATCH_SCORE: u32 = 15;
const RECENT_WEEK_SCORE: u32 = 2;
const RECENT_DAY_SCORE: u32 = 1;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const WEEK_MS: i64 = 7 * DAY_MS;

/// Rendered context plus disclosure counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSelection {
    /// One `[date] text` line per used note, most relevant first.
    pub rendered_context: String,
    /// Notes actually rendered.
    pub used_count: usize,
    /// Notes that were considered.
    pub total_count: usize,
}

/// One note with its relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredNote<'a> {
    pub note: &'a Note,
    pub score: u32,
}

/// Pre-processed question used to score many notes.
#[derive(Debug, Clone)]
pub struct QueryTerms {
    lowered_question: String,
    terms: Vec<String>,
}

impl QueryTerms {
    pub fn new(question: &str) -> Self {
        Self {
            lowered_question: question.to_lowercase(),
            terms: significant_words(question),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Scores one note at `now_ms` (epoch milliseconds).
    pub fn score(&self, note: &Note, now_ms: i64) -> u32 {
        let lowered_text = note.text.to_lowercase();
        let mut score = 0;

        for term in &self.terms {
            if lowered_text.contains(term.as_str()) {
                score += TERM_MATCH_SCORE;
            }
        }

        let mut seen_entities: Vec<String> = Vec::new();
        for value in note.entities.all_values() {
            let lowered_value = value.trim().to_lowercase();
            if lowered_value.is_empty() || seen_entities.contains(&lowered_value) {
                continue;
            }
            if self.lowered_question.contains(lowered_value.as_str()) {
                score += ENTITY_MATCH_SCORE;
            }
            seen_entities.push(lowered_value);
        }

        let age_ms = now_ms.saturating_sub(note.created_at);
        if age_ms < WEEK_MS {
            score += RECENT_WEEK_SCORE;
        }
        if age_ms < DAY_MS {
            score += RECENT_DAY_SCORE;
        }

        score
    }
}

/// Ranks notes for `question`, most relevant first.
///
/// Notes scoring zero are discarded. When every note is discarded, the
/// `fallback_notes` most recent notes are returned with score 0 instead.
pub fn rank_notes<'a>(
    question: &str,
    notes: &'a [Note],
    now_ms: i64,
    fallback_notes: usize,
) -> Vec<ScoredNote<'a>> {
    let query = QueryTerms::new(question);
    let mut ranked = notes
        .iter()
        .map(|note| ScoredNote {
            note,
            score: query.score(note, now_ms),
        })
        .filter(|scored| scored.score > 0)
        .collect::<Vec<_>>();

    if ranked.is_empty() {
        let mut recent = notes
            .iter()
            .map(|note| ScoredNote { note, score: 0 })
            .collect::<Vec<_>>();
        recent.sort_by(|left, right| newest_first(left.note, right.note));
        recent.truncate(fallback_notes);
        return recent;
    }

    ranked.sort_by(|left, right| {
        right
            .score
            .cmp(&left.score)
            .then_with(|| newest_first(left.note, right.note))
    });
    ranked
}

/// Selects context for `question` using default limits and the current time.
pub fn select_relevant_context(question: &str, notes: &[Note]) -> ContextSelection {
    select_relevant_context_with(
        question,
        notes,
        &ContextBudget::default(),
        Utc::now().timestamp_millis(),
    )
}

/// Selects and renders context for `question` within `budget`.
///
/// Notes are appended in rank order; rendering stops before the first note
/// that would exceed `budget.max_chars`.
pub fn select_relevant_context_with(
    question: &str,
    notes: &[Note],
    budget: &ContextBudget,
    now_ms: i64,
) -> ContextSelection {
    if notes.is_empty() {
        return ContextSelection::default();
    }

    let ranked = rank_notes(question, notes, now_ms, budget.fallback_notes);
    let fallback = ranked.first().is_some_and(|scored| scored.score == 0);

    let mut rendered_context = String::new();
    let mut used_chars = 0usize;
    let mut used_count = 0usize;

    for scored in ranked.iter().take(budget.max_notes) {
        let line = render_note_line(scored.note);
        let separator_chars = usize::from(!rendered_context.is_empty());
        let line_chars = line.chars().count();
        if used_chars + separator_chars + line_chars > budget.max_chars {
            break;
        }
        if separator_chars > 0 {
            rendered_context.push('\n');
        }
        rendered_context.push_str(&line);
        used_chars += separator_chars + line_chars;
        used_count += 1;
    }

    debug!(
        "event=context_select module=engine status=ok notes_total={} ranked={} used={} chars={} fallback={}",
        notes.len(),
        ranked.len(),
        used_count,
        used_chars,
        fallback
    );

    ContextSelection {
        rendered_context,
        used_count,
        total_count: notes.len(),
    }
}

/// Renders one note as `[M/D/YYYY] text` using its UTC creation date.
pub fn render_note_line(note: &Note) -> String {
    let date = DateTime::<Utc>::from_timestamp_millis(note.created_at)
        .map(|timestamp| timestamp.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|| "unknown date".to_string());
    format!("[{date}] {}", note.text)
}

fn newest_first(left: &Note, right: &Note) -> Ordering {
    right
        .created_at
        .cmp(&left.created_at)
        .then_with(|| left.id.cmp(&right.id))
}
