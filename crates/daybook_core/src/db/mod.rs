//! On-disk home of the offline blob cache.
//!
//! The cache is one SQLite file holding the last synced documents, so the
//! journal opens with data even when no remote is reachable.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`; a file stamped by a newer
//!   build is refused rather than downgraded.
//! - [`open_db`] hands out a connection only once the `blobs` table exists.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Parent directory of the cache file could not be created.
    CacheDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Cache file was written by a build with a newer schema.
    NewerCacheSchema { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "cache database error: {err}"),
            Self::CacheDir { path, source } => write!(
                f,
                "cannot create cache directory `{}`: {source}",
                path.display()
            ),
            Self::NewerCacheSchema { found, supported } => write!(
                f,
                "cache schema version {found} comes from a newer build (this build reads up to {supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::CacheDir { source, .. } => Some(source),
            Self::NewerCacheSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
