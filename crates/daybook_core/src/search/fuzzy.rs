//! Per-field match decision and snippet extraction.
//!
//! # Responsibility
//! - Decide whether a query hits one field text, exactly or approximately.
//! - Cut a short display snippet around the hit.
//! - Map mood keywords (`gut`, `bad`, ...) to mood ratings.
//!
//! # Invariants
//! - Fuzzy mode accepts everything exact mode accepts.
//! - A fuzzy hit needs both `distance <= 30% of the longer word` and
//!   `distance <= 2`.
//! - Words and queries shorter than 3 chars never match fuzzily.

use crate::model::entry::{mood_display, Mood};
use crate::search::levenshtein::distance;

/// Shortest word (and query) considered for approximate matching.
pub const MIN_FUZZY_LEN: usize = 3;
/// Hard cap on edits for an approximate hit.
pub const MAX_EDIT_DISTANCE: usize = 2;
/// Field title used for synthetic mood hits.
pub const MOOD_FIELD_TITLE: &str = "Mood";

const CONTEXT_CHARS: usize = 30;
const FUZZY_PREVIEW_CHARS: usize = 60;
const ELLIPSIS: &str = "...";

const MOOD_KEYWORDS: &[(&str, Mood)] = &[
    ("schlecht", Mood::Bad),
    ("traurig", Mood::Bad),
    ("down", Mood::Bad),
    ("bad", Mood::Bad),
    ("sad", Mood::Bad),
    ("normal", Mood::Neutral),
    ("okay", Mood::Neutral),
    ("ok", Mood::Neutral),
    ("neutral", Mood::Neutral),
    ("gut", Mood::Good),
    ("super", Mood::Good),
    ("toll", Mood::Good),
    ("großartig", Mood::Good),
    ("good", Mood::Good),
    ("great", Mood::Good),
];

/// Display text cut from a matching field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub text: String,
    /// `true` when only an approximate word hit was found.
    pub is_fuzzy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    /// Char range of the first case-insensitive occurrence in the original text.
    Exact { start: usize, end: usize },
    Fuzzy,
}

/// Returns whether `query` hits `text`.
pub fn is_match(query: &str, text: &str, fuzzy: bool) -> bool {
    find_hit(query, text, fuzzy).is_some()
}

/// Returns the display snippet for a hit, or `None` when `query` misses.
pub fn snippet(query: &str, text: &str, fuzzy: bool) -> Option<Snippet> {
    let snippet = match find_hit(query, text, fuzzy)? {
        Hit::Exact { start, end } => Snippet {
            text: context_window(text, start, end),
            is_fuzzy: false,
        },
        Hit::Fuzzy => Snippet {
            text: leading_preview(text),
            is_fuzzy: true,
        },
    };
    Some(snippet)
}

/// Maps a whole query to a mood when it is one of the mood keywords.
pub fn mood_for_keyword(query: &str) -> Option<Mood> {
    let normalized = query.trim().to_lowercase();
    MOOD_KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == normalized)
        .map(|(_, mood)| *mood)
}

/// Snippet shown for a synthetic mood hit, e.g. `😊 Good`.
pub fn mood_snippet(mood: Mood) -> String {
    let (emoji, label) = mood_display(Some(mood));
    format!("{emoji} {label}")
}

fn find_hit(query: &str, text: &str, fuzzy: bool) -> Option<Hit> {
    let folded_query = fold(query);
    if let Some((start, end)) = find_exact(text, &folded_query) {
        return Some(Hit::Exact { start, end });
    }
    if fuzzy && has_fuzzy_word(&folded_query, text) {
        return Some(Hit::Fuzzy);
    }
    None
}

fn fold(value: &str) -> Vec<char> {
    value.chars().flat_map(char::to_lowercase).collect()
}

/// Case-insensitive search returning the char range in the unfolded text.
///
/// Lowercasing can expand one char into several, so every folded char keeps
/// the index of the char it came from.
fn find_exact(text: &str, needle: &[char]) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return Some((0, 0));
    }
    let haystack: Vec<(char, usize)> = text
        .chars()
        .enumerate()
        .flat_map(|(index, c)| c.to_lowercase().map(move |lower| (lower, index)))
        .collect();
    let position = haystack
        .windows(needle.len())
        .position(|window| window.iter().map(|(c, _)| c).eq(needle.iter()))?;
    let start = haystack[position].1;
    let end = haystack[position + needle.len() - 1].1 + 1;
    Some((start, end))
}

fn has_fuzzy_word(folded_query: &[char], text: &str) -> bool {
    let query_len = folded_query.len();
    if query_len < MIN_FUZZY_LEN {
        return false;
    }
    let query: String = folded_query.iter().collect();
    text.to_lowercase().split_whitespace().any(|word| {
        let word_len = word.chars().count();
        if word_len < MIN_FUZZY_LEN {
            return false;
        }
        let edits = distance(&query, word);
        let relative_cap = query_len.max(word_len) * 3 / 10;
        edits <= relative_cap && edits <= MAX_EDIT_DISTANCE
    })
}

fn context_window(text: &str, start: usize, end: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let from = start.saturating_sub(CONTEXT_CHARS);
    let to = chars.len().min(end + CONTEXT_CHARS);

    let mut window = String::new();
    if from > 0 {
        window.push_str(ELLIPSIS);
    }
    window.extend(&chars[from..to]);
    if to < chars.len() {
        window.push_str(ELLIPSIS);
    }
    window
}

fn leading_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(FUZZY_PREVIEW_CHARS).collect();
    if text.chars().count() > FUZZY_PREVIEW_CHARS {
        preview.push_str(ELLIPSIS);
    }
    preview
}
