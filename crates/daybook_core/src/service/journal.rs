//! Journal session use-cases.
//!
//! # Responsibility
//! - Own the entry store, field titles, selected day and fuzzy toggle.
//! - Apply typed commands and hand every mutation to the sync reconciler.
//! - Accept pulled state only while it is still current.
//!
//! # Invariants
//! - `revision` increases with every state change, local or pulled.
//! - Reads and navigation never mutate the store.
//! - A pull started before a local edit is discarded.

use crate::config::SearchConfig;
use crate::interchange::csv_codec::{self, ImportBatch, ImportReport};
use crate::interchange::InterchangeResult;
use crate::model::entry::{DateKey, Entry, FieldSlot, FieldTitles, Mood};
use crate::search::index::{self, SearchQuery, SearchResult};
use crate::store::entry_store::{EntryStore, EntryUpdate};
use crate::sync::document::SyncSnapshot;
use crate::sync::reconciler::{PullSource, PulledState, SyncReconciler, SyncStatus};
use log::{debug, info};

/// One user-visible state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalCommand {
    UpdateField {
        date: DateKey,
        slot: FieldSlot,
        value: String,
    },
    SetMood {
        date: DateKey,
        mood: Option<Mood>,
    },
    RenameTitles(FieldTitles),
    MergeImport(ImportBatch),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Entry as stored after the change.
    Updated(Entry),
    TitlesRenamed,
    Imported(ImportReport),
}

/// Revision captured when a pull starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullTicket {
    revision: u64,
}

impl PullTicket {
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub source: PullSource,
    /// `false` when the pull was stale or found nothing.
    pub applied: bool,
    pub status: SyncStatus,
}

pub struct Journal {
    store: EntryStore,
    titles: FieldTitles,
    today: DateKey,
    selected: DateKey,
    fuzzy: bool,
    revision: u64,
    sync: Option<SyncReconciler>,
}

impl Journal {
    /// Creates an empty journal with `today` selected.
    pub fn new(today: DateKey, search: &SearchConfig) -> Self {
        Self {
            store: EntryStore::new(),
            titles: FieldTitles::default(),
            today,
            selected: today,
            fuzzy: search.fuzzy,
            revision: 0,
            sync: None,
        }
    }

    /// Attaches a reconciler; later mutations schedule pushes through it.
    pub fn with_sync(mut self, sync: SyncReconciler) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn sync(&self) -> Option<&SyncReconciler> {
        self.sync.as_ref()
    }

    pub fn sync_mut(&mut self) -> Option<&mut SyncReconciler> {
        self.sync.as_mut()
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn titles(&self) -> &FieldTitles {
        &self.titles
    }

    /// The day this session was opened on. Navigation never moves it.
    pub fn today(&self) -> DateKey {
        self.today
    }

    pub fn selected(&self) -> DateKey {
        self.selected
    }

    pub fn fuzzy(&self) -> bool {
        self.fuzzy
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Entry for `date`; blank when nothing is stored.
    pub fn entry(&self, date: DateKey) -> Entry {
        self.store.get(date)
    }

    pub fn current_entry(&self) -> Entry {
        self.store.get(self.selected)
    }

    pub fn go_to(&mut self, date: DateKey) {
        self.selected = date;
    }

    pub fn next_day(&mut self) -> DateKey {
        self.selected = self.selected.next_day();
        self.selected
    }

    pub fn previous_day(&mut self) -> DateKey {
        self.selected = self.selected.previous_day();
        self.selected
    }

    pub fn set_fuzzy(&mut self, fuzzy: bool) {
        self.fuzzy = fuzzy;
    }

    /// Applies one command and schedules a push when state changed.
    pub fn apply(&mut self, command: JournalCommand) -> CommandOutcome {
        match command {
            JournalCommand::UpdateField { date, slot, value } => {
                let entry = self
                    .store
                    .update(date, EntryUpdate::Field { slot, value })
                    .clone();
                self.mark_changed("update_field");
                CommandOutcome::Updated(entry)
            }
            JournalCommand::SetMood { date, mood } => {
                let entry = self.store.update(date, EntryUpdate::Mood(mood)).clone();
                self.mark_changed("set_mood");
                CommandOutcome::Updated(entry)
            }
            JournalCommand::RenameTitles(titles) => {
                if titles != self.titles {
                    self.titles = titles;
                    self.mark_changed("rename_titles");
                }
                CommandOutcome::TitlesRenamed
            }
            JournalCommand::MergeImport(batch) => {
                CommandOutcome::Imported(self.merge_import(batch))
            }
        }
    }

    /// Searches with the current fuzzy setting.
    pub fn search(&self, text: &str) -> Vec<SearchResult> {
        let query = SearchQuery {
            text: text.to_string(),
            fuzzy: self.fuzzy,
        };
        index::search(&self.store, &self.titles, &query)
    }

    pub fn export_csv(&self) -> InterchangeResult<String> {
        csv_codec::export_csv(&self.store, &self.titles)
    }

    /// Download name for an export made in this session.
    pub fn export_file_name(&self) -> String {
        csv_codec::export_file_name(self.today.date())
    }

    /// Parses `text` and merges it without touching existing dates.
    pub fn import_csv(&mut self, text: &str) -> InterchangeResult<ImportReport> {
        let batch = csv_codec::import_csv(text)?;
        Ok(self.merge_import(batch))
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            revision: self.revision,
            store: self.store.clone(),
            titles: self.titles.clone(),
        }
    }

    /// `Offline` when no reconciler is attached.
    pub fn sync_status(&self) -> SyncStatus {
        self.sync
            .as_ref()
            .map_or(SyncStatus::Offline, SyncReconciler::status)
    }

    pub fn begin_pull(&self) -> PullTicket {
        PullTicket {
            revision: self.revision,
        }
    }

    /// Replaces state with pulled documents unless the journal moved on.
    ///
    /// Returns `false` (and changes nothing) when a mutation happened after
    /// `ticket` was taken or a local push has not completed.
    pub fn apply_pull(&mut self, ticket: PullTicket, state: PulledState) -> bool {
        let push_outstanding = self
            .sync
            .as_ref()
            .is_some_and(SyncReconciler::has_unfinished_push);
        if ticket.revision != self.revision || push_outstanding {
            info!(
                "event=sync_apply module=journal status=stale ticket_revision={} revision={} push_outstanding={}",
                ticket.revision, self.revision, push_outstanding
            );
            return false;
        }
        if state.is_empty() {
            return false;
        }

        if let Some(store) = state.store {
            self.store = store;
        }
        if let Some(titles) = state.titles {
            self.titles = titles;
        }
        self.revision += 1;
        info!(
            "event=sync_apply module=journal status=ok revision={} entries={}",
            self.revision,
            self.store.len()
        );
        true
    }

    /// Pulls and applies in one step.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        let ticket = self.begin_pull();
        let Some(sync) = self.sync.as_ref() else {
            return RefreshOutcome {
                source: PullSource::Nothing,
                applied: false,
                status: SyncStatus::Offline,
            };
        };
        let outcome = sync.pull().await;
        let applied = self.apply_pull(ticket, outcome.state);
        RefreshOutcome {
            source: outcome.source,
            applied,
            status: outcome.status,
        }
    }

    /// Pushes any scheduled change immediately instead of waiting for the
    /// debounce window.
    pub async fn flush(&mut self) -> SyncStatus {
        let snapshot = self.snapshot();
        match self.sync.as_mut() {
            Some(sync) if sync.has_unfinished_push() => sync.push_now(snapshot).await,
            Some(sync) => sync.status(),
            None => SyncStatus::Offline,
        }
    }

    fn merge_import(&mut self, batch: ImportBatch) -> ImportReport {
        let report = batch.merge_into(&mut self.store);
        if let Some(titles) = &report.new_field_titles {
            self.titles = titles.clone();
        }
        if report.imported > 0 || report.new_field_titles.is_some() {
            self.mark_changed("merge_import");
        }
        info!(
            "event=csv_import module=journal status=ok imported={} already_present={} skipped={}",
            report.imported,
            report.already_present,
            report.skipped_count()
        );
        report
    }

    fn mark_changed(&mut self, command: &str) {
        self.revision += 1;
        debug!(
            "event=journal_apply module=journal status=ok command={} revision={}",
            command, self.revision
        );
        if self.sync.is_some() {
            let snapshot = self.snapshot();
            if let Some(sync) = self.sync.as_mut() {
                sync.schedule_push(snapshot);
            }
        }
    }
}
