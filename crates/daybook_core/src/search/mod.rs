//! Approximate full-text search over journal entries.
//!
//! # Responsibility
//! - Provide edit distance, per-field matching and store-wide queries.
//! - Keep result shaping (snippets, mood hits, ordering) inside core.

pub mod fuzzy;
pub mod index;
pub mod levenshtein;
