//! Store-wide search producing ranked, annotated results.
//!
//! # Responsibility
//! - Run every entry through the fuzzy engine and the mood keyword rule.
//! - Shape per-field hits into display-ready results.
//!
//! # Invariants
//! - Results are ordered by date, newest first.
//! - An entry appears at most once, and only with at least one match.
//! - Blank queries return no results.

use crate::model::entry::{DateKey, FieldTitles, Mood};
use crate::search::fuzzy::{mood_for_keyword, mood_snippet, snippet, MOOD_FIELD_TITLE};
use crate::store::entry_store::EntryStore;
use log::debug;

/// Search options for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// User query text.
    pub text: String,
    /// Whether approximate word hits are accepted.
    pub fuzzy: bool,
}

impl SearchQuery {
    /// Creates a query with fuzzy matching enabled.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fuzzy: true,
        }
    }

    /// Creates a query restricted to case-insensitive substring hits.
    pub fn exact(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fuzzy: false,
        }
    }
}

/// One matching field (or the synthetic mood field) of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field_title: String,
    pub snippet: String,
    pub is_exact_match: bool,
}

/// One matching day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub date: DateKey,
    pub matches: Vec<FieldMatch>,
    pub mood: Option<Mood>,
}

impl SearchResult {
    /// Whether any match on this day was approximate.
    pub fn has_fuzzy_match(&self) -> bool {
        self.matches.iter().any(|m| !m.is_exact_match)
    }
}

/// Searches all entries and returns hits newest first.
pub fn search(store: &EntryStore, titles: &FieldTitles, query: &SearchQuery) -> Vec<SearchResult> {
    let text = query.text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let keyword_mood = mood_for_keyword(text);

    // The store iterates ascending, so walking it backwards yields the
    // date-descending order directly.
    let results: Vec<SearchResult> = store
        .iter()
        .rev()
        .filter_map(|entry| {
            let mut matches: Vec<FieldMatch> = titles
                .iter()
                .filter_map(|(slot, title)| {
                    snippet(text, entry.field(slot), query.fuzzy).map(|found| FieldMatch {
                        field_title: title.to_string(),
                        snippet: found.text,
                        is_exact_match: !found.is_fuzzy,
                    })
                })
                .collect();

            if let Some(mood) = keyword_mood.filter(|mood| entry.mood == Some(*mood)) {
                matches.push(FieldMatch {
                    field_title: MOOD_FIELD_TITLE.to_string(),
                    snippet: mood_snippet(mood),
                    is_exact_match: true,
                });
            }

            (!matches.is_empty()).then(|| SearchResult {
                date: entry.date,
                matches,
                mood: entry.mood,
            })
        })
        .collect();

    debug!(
        "event=search module=search status=ok query_chars={} fuzzy={} scanned={} hits={}",
        text.chars().count(),
        query.fuzzy,
        store.len(),
        results.len()
    );
    results
}
