//! In-memory entry store keyed by date.
//!
//! # Responsibility
//! - Own the mapping from `DateKey` to `Entry`.
//! - Provide the single mutation primitive (`update`) and the
//!   non-destructive bulk insert used by import and sync (`merge`).
//!
//! # Invariants
//! - Reads never insert; `get` synthesizes an empty entry instead.
//! - `merge` never touches a date that is already present.
//! - Iteration is always ascending by date.

use crate::model::entry::{DateKey, Entry, FieldSlot, Mood};
use std::collections::btree_map::{self, BTreeMap};

/// One atomic change to a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryUpdate {
    /// Replace the text of one field.
    Field { slot: FieldSlot, value: String },
    /// Replace (or clear) the mood rating.
    Mood(Option<Mood>),
}

/// Counts returned by [`EntryStore::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Dates that were absent and are now stored.
    pub inserted: usize,
    /// Dates that were already present and left untouched.
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStore {
    entries: BTreeMap<DateKey, Entry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from entries; on duplicate dates the first one wins.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut store = Self::new();
        store.merge(entries);
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, date: DateKey) -> bool {
        self.entries.contains_key(&date)
    }

    /// Returns the stored entry, if any.
    pub fn lookup(&self, date: DateKey) -> Option<&Entry> {
        self.entries.get(&date)
    }

    /// Returns the stored entry or a blank one for `date`.
    ///
    /// The blank entry is not inserted.
    pub fn get(&self, date: DateKey) -> Entry {
        self.entries
            .get(&date)
            .cloned()
            .unwrap_or_else(|| Entry::empty(date))
    }

    /// Applies one change to `date`, inserting the day if needed.
    ///
    /// Returns the entry as stored after the change.
    pub fn update(&mut self, date: DateKey, change: EntryUpdate) -> &Entry {
        let entry = self
            .entries
            .entry(date)
            .or_insert_with(|| Entry::empty(date));
        match change {
            EntryUpdate::Field { slot, value } => entry.fields[slot.index()] = value,
            EntryUpdate::Mood(mood) => entry.mood = mood,
        }
        entry
    }

    /// Inserts every incoming entry whose date is not stored yet.
    ///
    /// Present dates are skipped even when the stored entry is blank and the
    /// incoming one is not. Merging the same batch twice is a no-op the
    /// second time.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = Entry>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for entry in incoming {
            match self.entries.entry(entry.date) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(entry);
                    outcome.inserted += 1;
                }
                btree_map::Entry::Occupied(_) => outcome.skipped += 1,
            }
        }
        outcome
    }

    /// Entries ascending by date.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn dates(&self) -> impl DoubleEndedIterator<Item = DateKey> + '_ {
        self.entries.keys().copied()
    }
}

impl<'a> IntoIterator for &'a EntryStore {
    type Item = &'a Entry;
    type IntoIter = btree_map::Values<'a, DateKey, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
