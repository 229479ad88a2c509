//! Leading project-reference detection for new notes.
//!
//! # Responsibility
//! - Match a leading `Name: rest`, `Name, rest`, `Name. rest` or bare
//!   `Name rest` prefix against active project names.
//! - Return the canonical project name and the text with the prefix stripped.
//!
//! # Invariants
//! - Matching is case-insensitive and exact; no fuzzy tolerance.
//! - Text without a recognized prefix is never modified.
//! - A match never leaves an empty note body.

use once_cell::sync::Lazy;
use regex::Regex;

const SEPARATORS: [char; 3] = [':', ',', '.'];

static COLON_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([^:]+):\s*(.*)$").expect("valid colon prefix regex"));
static COMMA_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([^,]+),\s*(.*)$").expect("valid comma prefix regex"));
static PERIOD_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([^.]+)\.\s*(.*)$").expect("valid period prefix regex"));

/// Detected project and remaining note body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMatch {
    /// Project name as stored, not as typed.
    pub project: String,
    pub stripped_text: String,
}

type PrefixStrategy = fn(&str, &[&str]) -> Option<ProjectMatch>;

/// Evaluated in order; first match wins.
const STRATEGIES: &[PrefixStrategy] = &[colon_prefix, comma_prefix, period_prefix, bare_prefix];

/// Detects a leading project reference in `text`.
///
/// Returns `None` when no active project is referenced; callers then store
/// the text unchanged under the fallback project.
pub fn classify_project<S: AsRef<str>>(
    text: &str,
    active_project_names: &[S],
) -> Option<ProjectMatch> {
    let names = active_project_names
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>();
    let text = text.trim_start();
    if names.is_empty() || text.is_empty() {
        return None;
    }

    STRATEGIES.iter().find_map(|strategy| strategy(text, &names))
}

fn colon_prefix(text: &str, names: &[&str]) -> Option<ProjectMatch> {
    separated_prefix(&COLON_PREFIX_RE, text, names)
}

fn comma_prefix(text: &str, names: &[&str]) -> Option<ProjectMatch> {
    separated_prefix(&COMMA_PREFIX_RE, text, names)
}

fn period_prefix(text: &str, names: &[&str]) -> Option<ProjectMatch> {
    separated_prefix(&PERIOD_PREFIX_RE, text, names)
}

fn separated_prefix(pattern: &Regex, text: &str, names: &[&str]) -> Option<ProjectMatch> {
    let captures = pattern.captures(text)?;
    let segment = captures.get(1)?.as_str().trim();
    let rest = captures.get(2)?.as_str().trim();
    let project = find_name(names, segment)?;
    build_match(project, rest)
}

/// Dictation without punctuation: `Name` followed by whitespace or a separator.
fn bare_prefix(text: &str, names: &[&str]) -> Option<ProjectMatch> {
    let mut by_length = names.to_vec();
    by_length.sort_by_key(|name| std::cmp::Reverse(name.chars().count()));

    for name in by_length {
        let Some(prefix_end) = char_boundary_after(text, name.chars().count()) else {
            continue;
        };
        let (prefix, rest) = text.split_at(prefix_end);
        if prefix.to_lowercase() != name.to_lowercase() {
            continue;
        }
        let Some(next) = rest.chars().next() else {
            continue;
        };
        if !next.is_whitespace() && !SEPARATORS.contains(&next) {
            continue;
        }
        let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || SEPARATORS.contains(&c));
        if let Some(found) = build_match(name, rest.trim_end()) {
            return Some(found);
        }
    }
    None
}

fn find_name<'a>(names: &[&'a str], segment: &str) -> Option<&'a str> {
    let lowered = segment.to_lowercase();
    names
        .iter()
        .copied()
        .find(|name| name.to_lowercase() == lowered)
}

fn build_match(project: &str, rest: &str) -> Option<ProjectMatch> {
    if rest.is_empty() {
        return None;
    }
    Some(ProjectMatch {
        project: project.to_string(),
        stripped_text: rest.to_string(),
    })
}

fn char_boundary_after(text: &str, chars: usize) -> Option<usize> {
    if chars == 0 {
        return None;
    }
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .or_else(|| (text.chars().count() == chars).then_some(text.len()))
}
