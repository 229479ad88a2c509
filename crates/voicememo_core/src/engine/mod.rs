//! Rule-based classification and relevance engine.
//!
//! # Responsibility
//! - Rank stored notes against a question within a context budget.
//! - Detect a leading project reference in new note text.
//! - Propose pending tasks a new note may complete.
//!
//! # Invariants
//! - All functions are pure and synchronous over caller-provided inputs.
//! - No function fails: empty inputs yield empty or fallback outputs.

pub mod project_classifier;
pub mod relevance;
pub mod task_matcher;
mod text;
