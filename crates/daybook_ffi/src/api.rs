//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the journal session to Dart via FRB as plain sync calls.
//! - Own the process-wide session and the runtime that drives sync.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures are reported as messages inside response envelopes.
//! - Dates cross the boundary as canonical `YYYY-MM-DD` strings.

use daybook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    mood_display, ping as ping_inner, CommandOutcome, DateKey, DaybookConfig, Entry, FieldSlot,
    FieldTitles, Journal, JournalCommand, Mood, SearchResult, SqliteLocalCache, SyncReconciler,
};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Runtime;

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

struct Session {
    journal: Journal,
    runtime: Runtime,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One journal day as shown by the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    /// Canonical `YYYY-MM-DD`.
    pub date: String,
    /// Always three values, in field order.
    pub fields: Vec<String>,
    /// `1..=3`, or `None` when unrated.
    pub mood: Option<u8>,
    pub mood_emoji: String,
    pub mood_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryResponse {
    pub ok: bool,
    pub entry: Option<EntryView>,
    pub message: String,
}

impl EntryResponse {
    fn success(entry: &Entry) -> Self {
        Self {
            ok: true,
            entry: Some(to_entry_view(entry)),
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            entry: None,
            message: message.into(),
        }
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatchItem {
    pub field_title: String,
    pub snippet: String,
    pub is_exact_match: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    pub date: String,
    pub mood: Option<u8>,
    pub matches: Vec<SearchMatchItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    /// Newest day first.
    pub items: Vec<SearchItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExportResponse {
    pub ok: bool,
    /// Suggested download name, e.g. `journal_export_2024-03-05.csv`.
    pub file_name: String,
    pub content: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvImportResponse {
    pub ok: bool,
    pub imported: u32,
    pub already_present: u32,
    pub skipped: u32,
    pub titles_adopted: bool,
    pub message: String,
}

impl CsvImportResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            imported: 0,
            already_present: 0,
            skipped: 0,
            titles_adopted: false,
            message: message.into(),
        }
    }
}

/// Opens (or reopens) the journal session.
///
/// Input semantics:
/// - `today`: `YYYY-MM-DD`, selected initially.
/// - `data_dir`: directory holding `daybook.toml` and the cache database;
///   `None` uses defaults and the system temp dir.
///
/// # FFI contract
/// - Sync call; loads cached state before returning.
/// - A previous session is flushed and replaced.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_open(today: String, data_dir: Option<String>) -> ActionResponse {
    let today = match parse_date(&today) {
        Ok(date) => date,
        Err(message) => return ActionResponse::failure(message),
    };
    let data_dir = data_dir
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from);

    let config = match data_dir.as_deref() {
        Some(dir) => match DaybookConfig::load(&DaybookConfig::path(dir)) {
            Ok(config) => config,
            Err(err) => return ActionResponse::failure(format!("journal_open failed: {err}")),
        },
        None => DaybookConfig::default(),
    };
    let problems = config.validate();
    if !problems.is_empty() {
        warn!(
            "event=config_repair module=ffi status=ok problems={}",
            problems.len()
        );
    }
    let config = config.with_defaults_for_invalid();

    let mut session = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(mut previous) = session.take() {
        previous.runtime.block_on(previous.journal.flush());
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => return ActionResponse::failure(format!("journal_open failed: {err}")),
    };
    let db_path = config.cache.resolve_db_path(data_dir.as_deref());
    let cache = match SqliteLocalCache::open(&db_path) {
        Ok(cache) => cache,
        Err(err) => return ActionResponse::failure(format!("journal_open failed: {err}")),
    };

    let sync = SyncReconciler::new(runtime.handle().clone(), Arc::new(cache), config.sync);
    let mut journal = Journal::new(today, &config.search).with_sync(sync);
    let outcome = runtime.block_on(journal.refresh());
    let loaded = journal.store().len();
    info!(
        "event=journal_open module=ffi status=ok source={:?} entries={}",
        outcome.source, loaded
    );

    *session = Some(Session { journal, runtime });
    ActionResponse::success(format!("Loaded {loaded} day(s)."))
}

/// Returns the entry for `date`; a blank entry when the day is empty.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_get(date: String) -> EntryResponse {
    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(message) => return EntryResponse::failure(message),
    };
    match with_session(|session| session.journal.entry(date)) {
        Ok(entry) => EntryResponse::success(&entry),
        Err(message) => EntryResponse::failure(message),
    }
}

/// Replaces one field; `index` is 0-based.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_update_field(date: String, index: u32, value: String) -> EntryResponse {
    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(message) => return EntryResponse::failure(message),
    };
    let slot = match FieldSlot::try_from(index as usize) {
        Ok(slot) => slot,
        Err(err) => return EntryResponse::failure(err.to_string()),
    };
    apply_entry_command(JournalCommand::UpdateField { date, slot, value })
}

/// Sets (`1..=3`) or clears (`None`) the mood of `date`.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_set_mood(date: String, mood: Option<u8>) -> EntryResponse {
    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(message) => return EntryResponse::failure(message),
    };
    let mood = match mood {
        Some(value) => match Mood::from_value(i64::from(value)) {
            Some(mood) => Some(mood),
            None => return EntryResponse::failure(format!("mood must be 1..=3, got {value}")),
        },
        None => None,
    };
    apply_entry_command(JournalCommand::SetMood { date, mood })
}

/// Current field titles, always three.
#[flutter_rust_bridge::frb(sync)]
pub fn field_titles() -> Vec<String> {
    with_session(|session| session.journal.titles().as_array().to_vec())
        .unwrap_or_else(|_| FieldTitles::default().as_array().to_vec())
}

/// Renames all three fields at once; stored values are untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn rename_titles(titles: Vec<String>) -> ActionResponse {
    let titles: [String; 3] = match titles.try_into() {
        Ok(titles) => titles,
        Err(titles) => {
            return ActionResponse::failure(format!(
                "expected 3 field titles, got {}",
                titles.len()
            ))
        }
    };
    match with_session(|session| {
        session
            .journal
            .apply(JournalCommand::RenameTitles(FieldTitles::new(titles)))
    }) {
        Ok(_) => ActionResponse::success("Titles renamed."),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Searches all days; `fuzzy` updates the session toggle when given.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_search(text: String, fuzzy: Option<bool>) -> SearchResponse {
    let results = with_session(|session| {
        if let Some(fuzzy) = fuzzy {
            session.journal.set_fuzzy(fuzzy);
        }
        session.journal.search(&text)
    });
    match results {
        Ok(results) => {
            let items: Vec<SearchItem> = results.into_iter().map(to_search_item).collect();
            let message = if items.is_empty() {
                "No results.".to_string()
            } else {
                format!("Found {} day(s).", items.len())
            };
            SearchResponse { items, message }
        }
        Err(message) => SearchResponse {
            items: Vec::new(),
            message: format!("entry_search failed: {message}"),
        },
    }
}

/// Serializes every day as CSV.
#[flutter_rust_bridge::frb(sync)]
pub fn csv_export() -> CsvExportResponse {
    let exported = with_session(|session| {
        let file_name = session.journal.export_file_name();
        session
            .journal
            .export_csv()
            .map(|content| (file_name, content))
            .map_err(|err| err.to_string())
    });
    match exported.and_then(|result| result) {
        Ok((file_name, content)) => CsvExportResponse {
            ok: true,
            file_name,
            content,
            message: String::new(),
        },
        Err(message) => CsvExportResponse {
            ok: false,
            file_name: String::new(),
            content: String::new(),
            message: format!("csv_export failed: {message}"),
        },
    }
}

/// Merges CSV text without overwriting existing days.
#[flutter_rust_bridge::frb(sync)]
pub fn csv_import(text: String) -> CsvImportResponse {
    let imported = with_session(|session| {
        session
            .journal
            .import_csv(&text)
            .map_err(|err| err.to_string())
    });
    match imported.and_then(|result| result) {
        Ok(report) => CsvImportResponse {
            ok: true,
            imported: saturating_u32(report.imported),
            already_present: saturating_u32(report.already_present),
            skipped: saturating_u32(report.skipped_count()),
            titles_adopted: report.new_field_titles.is_some(),
            message: format!(
                "Imported {} day(s); {} already present; {} row(s) skipped.",
                report.imported,
                report.already_present,
                report.skipped_count()
            ),
        },
        Err(message) => CsvImportResponse::failure(format!("csv_import failed: {message}")),
    }
}

/// `offline|syncing|synced|error`; `offline` without a session.
#[flutter_rust_bridge::frb(sync)]
pub fn sync_status() -> String {
    with_session(|session| session.journal.sync_status().as_str())
        .unwrap_or("offline")
        .to_string()
}

/// Pushes pending edits now; returns the resulting sync status.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_flush() -> String {
    with_session(|session| {
        session
            .runtime
            .block_on(session.journal.flush())
            .as_str()
    })
    .unwrap_or("offline")
    .to_string()
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> T) -> Result<T, String> {
    let mut guard = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    let session = guard
        .as_mut()
        .ok_or_else(|| "journal is not open; call journal_open first".to_string())?;
    Ok(f(session))
}

fn apply_entry_command(command: JournalCommand) -> EntryResponse {
    match with_session(|session| session.journal.apply(command)) {
        Ok(CommandOutcome::Updated(entry)) => EntryResponse::success(&entry),
        Ok(_) => EntryResponse::failure("unexpected command outcome"),
        Err(message) => EntryResponse::failure(message),
    }
}

fn parse_date(raw: &str) -> Result<DateKey, String> {
    raw.trim().parse::<DateKey>().map_err(|err| err.to_string())
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_entry_view(entry: &Entry) -> EntryView {
    let (emoji, label) = mood_display(entry.mood);
    EntryView {
        date: entry.date.to_string(),
        fields: entry.fields.to_vec(),
        mood: entry.mood.map(Mood::value),
        mood_emoji: emoji.to_string(),
        mood_label: label.to_string(),
    }
}

fn to_search_item(result: SearchResult) -> SearchItem {
    SearchItem {
        date: result.date.to_string(),
        mood: result.mood.map(Mood::value),
        matches: result
            .matches
            .into_iter()
            .map(|found| SearchMatchItem {
                field_title: found.field_title,
                snippet: found.snippet,
                is_exact_match: found.is_exact_match,
            })
            .collect(),
    }
}
