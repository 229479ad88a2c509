//! Shared tokenization helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid word regex"));

const MIN_SIGNIFICANT_WORD_CHARS: usize = 3;

/// Lowercased, deduplicated words longer than two characters, in first-seen order.
pub(crate) fn significant_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut words: Vec<String> = Vec::new();
    for found in WORD_RE.find_iter(&lowered) {
        let word = found.as_str();
        if word.chars().count() < MIN_SIGNIFICANT_WORD_CHARS {
            continue;
        }
        if !words.iter().any(|existing| existing == word) {
            words.push(word.to_string());
        }
    }
    words
}
