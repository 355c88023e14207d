//! Core domain logic for Daybook, a date-keyed personal journal.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod interchange;
pub mod logging;
pub mod model;
pub mod search;
pub mod service;
pub mod store;
pub mod sync;

pub use config::{ConfigError, DaybookConfig, LoggingConfig, SearchConfig, SyncConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use interchange::csv_codec::{
    export_csv, export_file_name, import_csv, ImportBatch, ImportReport, SkipReason, SkippedRow,
};
pub use interchange::{InterchangeError, InterchangeResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::entry::{
    mood_display, DateKey, Entry, FieldSlot, FieldTitles, Mood, ValidationError,
};
pub use search::index::{search, FieldMatch, SearchQuery, SearchResult};
pub use service::journal::{CommandOutcome, Journal, JournalCommand, PullTicket, RefreshOutcome};
pub use store::entry_store::{EntryStore, EntryUpdate, MergeOutcome};
pub use sync::blob::{LocalCache, MemoryBlobStore, RemoteBlobStore, StorageError, StorageResult};
pub use sync::local_cache::SqliteLocalCache;
pub use sync::reconciler::{PullOutcome, PullSource, PulledState, SyncReconciler, SyncStatus};
pub use sync::remote_registry::{RemoteRegistry, RemoteRegistryError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
