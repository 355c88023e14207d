//! Blob-store contracts consumed by the sync layer.
//!
//! # Responsibility
//! - Define the remote (async) and local cache (sync) `get`/`put` contracts.
//! - Provide an in-process store usable as either side.
//!
//! # Invariants
//! - `get` returns `Ok(None)` for a missing key; errors mean the store
//!   could not be asked.
//! - Implementations never panic on transport failure.

use crate::db::DbError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer error for remote and cache access.
#[derive(Debug)]
pub enum StorageError {
    /// Store could not be reached or refused the request.
    Unavailable { key: String, message: String },
    /// Call did not finish within the configured timeout.
    Timeout { key: String, after_ms: u128 },
    /// Stored bytes are not a supported document.
    Decode(String),
    /// State could not be serialized.
    Encode(String),
    /// Local cache database failure.
    Cache(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { key, message } => {
                write!(f, "blob store unavailable for `{key}`: {message}")
            }
            Self::Timeout { key, after_ms } => {
                write!(f, "blob store call for `{key}` timed out after {after_ms} ms")
            }
            Self::Decode(message) => write!(f, "invalid sync document: {message}"),
            Self::Encode(message) => write!(f, "failed to encode sync document: {message}"),
            Self::Cache(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cache(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Cache(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Cache(DbError::Sqlite(value))
    }
}

/// Remote blob store adapter (cloud drive, WebDAV, ...).
#[async_trait]
pub trait RemoteBlobStore: Send + Sync {
    /// Stable lowercase adapter id, e.g. `google_drive`.
    fn remote_id(&self) -> &str;

    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    async fn put(&self, key: &str, bytes: Vec<u8>) -> StorageResult<()>;
}

/// Always-available local mirror with the same contract as the remote.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<()>;
}

/// In-process blob store.
///
/// Serves as an offline remote in tests and as a throwaway cache. It can be
/// switched offline or slowed down to exercise failure paths.
pub struct MemoryBlobStore {
    id: String,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    offline: AtomicBool,
    latency: Mutex<Duration>,
    puts: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            blobs: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            latency: Mutex::new(Duration::ZERO),
            puts: AtomicUsize::new(0),
        }
    }

    /// Makes every remote call fail with [`StorageError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delays every remote call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Number of successful writes so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn read(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn write(&self, key: &str, bytes: &[u8]) {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes.to_vec());
        self.puts.fetch_add(1, Ordering::SeqCst);
    }

    fn check_online(&self, key: &str) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                key: key.to_string(),
                message: format!("{} is offline", self.id),
            });
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteBlobStore for MemoryBlobStore {
    fn remote_id(&self) -> &str {
        &self.id
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.simulate_latency().await;
        self.check_online(key)?;
        Ok(self.read(key))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> StorageResult<()> {
        self.simulate_latency().await;
        self.check_online(key)?;
        self.write(key, &bytes);
        Ok(())
    }
}

impl LocalCache for MemoryBlobStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.read(key))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        self.write(key, bytes);
        Ok(())
    }
}
