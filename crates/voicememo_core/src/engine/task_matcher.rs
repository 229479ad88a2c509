//! Completion-language detection and pending-task matching.
//!
//! # Responsibility
//! - Gate on a fixed completion-keyword vocabulary.
//! - Score pending tasks by description-word overlap with the note text.
//!
//! # Invariants
//! - Never mutates task state; callers decide whether to apply candidates.
//! - Text without completion language yields no candidates.
//! - Candidates are ordered by confidence, highest first.

use crate::engine::text::significant_words;
use crate::model::task::{CompletionCandidate, Task};
use log::debug;

/// Phrases indicating that something was just done.
pub const COMPLETION_KEYWORDS: &[&str] = &[
    "done",
    "finished",
    "completed",
    "called",
    "talked to",
    "met with",
    "spoke to",
    "emailed",
    "sent",
    "bought",
    "picked up",
    "dropped off",
    "scheduled",
    "booked",
    "paid",
    "submitted",
    "replied to",
    "fixed",
];

const MAX_REQUIRED_OVERLAP: usize = 2;

/// Returns the completion keywords found in `text`, in vocabulary order.
///
/// Cheap signal for callers that do not need per-task matching.
pub fn detect_completion_keywords(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    COMPLETION_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lowered.contains(keyword))
        .collect()
}

/// Minimum overlapping words for a task with `word_count` descriptive words.
///
/// `min(2, ceil(word_count / 2))`.
pub fn required_overlap(word_count: usize) -> usize {
    MAX_REQUIRED_OVERLAP.min(word_count.div_ceil(2))
}

/// Proposes pending tasks that `text` plausibly completes.
///
/// Non-pending tasks and tasks without descriptive words are ignored.
/// Returned candidates carry no note id yet.
pub fn match_task_completions(text: &str, pending_tasks: &[Task]) -> Vec<CompletionCandidate> {
    let keywords = detect_completion_keywords(text);
    if keywords.is_empty() {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let mut candidates = Vec::new();
    for task in pending_tasks.iter().filter(|task| task.is_pending()) {
        let words = significant_words(&task.description);
        if words.is_empty() {
            continue;
        }
        let matched_words = words
            .iter()
            .filter(|word| lowered.contains(word.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        if matched_words.len() < required_overlap(words.len()) {
            continue;
        }
        let confidence = matched_words.len() as f64 / words.len() as f64;
        candidates.push(CompletionCandidate {
            task_id: task.id,
            note_id: None,
            matched_words,
            confidence,
        });
    }

    candidates.sort_by(|left, right| right.confidence.total_cmp(&left.confidence));

    debug!(
        "event=task_match module=engine status=ok keywords={} tasks={} candidates={}",
        keywords.len(),
        pending_tasks.len(),
        candidates.len()
    );
    candidates
}
