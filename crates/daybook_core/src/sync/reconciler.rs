//! Debounced push and fallback pull between journal state and blob stores.
//!
//! # Responsibility
//! - Coalesce bursts of edits into one outbound write per quiet period.
//! - Mirror every write to the local cache, reachable remote or not.
//! - Load state from the remote, falling back to the cache.
//!
//! # Invariants
//! - At most one push timer is pending; scheduling replaces it.
//! - Cancelling a pending push never aborts a call already in flight.
//! - Pushes run one at a time and a push older than the last successful
//!   one is dropped.
//! - Every remote call is bounded by the configured timeout.
//! - Last writer wins; no content is merged between remote and cache.

use crate::config::SyncConfig;
use crate::model::entry::FieldTitles;
use crate::store::entry_store::EntryStore;
use crate::sync::blob::{LocalCache, RemoteBlobStore, StorageError, StorageResult};
use crate::sync::document::{
    decode_entries, decode_settings, EncodedSnapshot, EntriesDocument, SyncSnapshot,
};
use crate::sync::remote_registry::RemoteRegistry;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

/// Connection state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No remote selected; writes go to the local cache only.
    Offline,
    Syncing,
    Synced,
    /// Last remote call failed or timed out; local cache is authoritative.
    Error,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

/// Where pulled state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullSource {
    Remote,
    Cache,
    /// Neither side had any document.
    Nothing,
}

/// Documents loaded by a pull; each is optional on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulledState {
    pub store: Option<EntryStore>,
    pub titles: Option<FieldTitles>,
}

impl PulledState {
    pub fn is_empty(&self) -> bool {
        self.store.is_none() && self.titles.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    pub source: PullSource,
    pub state: PulledState,
    pub status: SyncStatus,
}

/// Debounce timer for one scheduled push, stamped with its revision.
pub struct PendingSync {
    revision: u64,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl PendingSync {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// `true` once the push ran to completion (or was cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the timer. Returns `false` when it had already fired.
    fn cancel(mut self) -> bool {
        self.cancel
            .take()
            .is_some_and(|cancel| cancel.send(()).is_ok())
    }
}

/// Shared state cloned into every spawned push.
#[derive(Clone)]
struct SyncWorker {
    remote: Option<Arc<dyn RemoteBlobStore>>,
    cache: Arc<dyn LocalCache>,
    config: Arc<SyncConfig>,
    status: Arc<watch::Sender<SyncStatus>>,
    /// Revision of the last push that reached its destination.
    last_pushed: Arc<AsyncMutex<Option<u64>>>,
}

pub struct SyncReconciler {
    runtime: Handle,
    worker: SyncWorker,
    pending: Option<PendingSync>,
}

impl SyncReconciler {
    /// Creates a cache-only reconciler; attach a remote with [`Self::set_remote`].
    ///
    /// `runtime` runs debounce timers and network calls.
    pub fn new(runtime: Handle, cache: Arc<dyn LocalCache>, config: SyncConfig) -> Self {
        let (status, _) = watch::channel(SyncStatus::Offline);
        Self {
            runtime,
            worker: SyncWorker {
                remote: None,
                cache,
                config: Arc::new(config),
                status: Arc::new(status),
                last_pushed: Arc::new(AsyncMutex::new(None)),
            },
            pending: None,
        }
    }

    /// Switches the remote used by later pushes and pulls.
    ///
    /// Pushes already in flight keep their original target.
    pub fn set_remote(&mut self, remote: Option<Arc<dyn RemoteBlobStore>>) {
        match &remote {
            Some(remote) => info!(
                "event=sync_remote module=sync status=ok remote_id={}",
                remote.remote_id()
            ),
            None => {
                info!("event=sync_remote module=sync status=ok remote_id=none");
                self.worker.set_status(SyncStatus::Offline);
            }
        }
        self.worker.remote = remote;
    }

    /// Targets the registry's active remote, or none when nothing is active.
    pub fn follow_active(&mut self, registry: &RemoteRegistry) {
        self.set_remote(registry.active_remote());
    }

    pub fn has_remote(&self) -> bool {
        self.worker.remote.is_some()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.worker.config
    }

    pub fn status(&self) -> SyncStatus {
        self.worker.current_status()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.worker.status.subscribe()
    }

    pub fn pending(&self) -> Option<&PendingSync> {
        self.pending.as_ref()
    }

    /// `true` while a scheduled push has not completed yet.
    pub fn has_unfinished_push(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }

    /// Starts (or restarts) the debounce timer for `snapshot`.
    ///
    /// A timer that has not fired yet is cancelled and replaced.
    pub fn schedule_push(&mut self, snapshot: SyncSnapshot) {
        let replaced = self.cancel_pending();
        let revision = snapshot.revision;
        let debounce = self.worker.config.debounce();
        let worker = self.worker.clone();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let handle = self.runtime.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(debounce) => {}
                _ = cancel_rx => return,
            }
            worker.push(snapshot).await;
        });

        debug!(
            "event=sync_schedule module=sync status=ok revision={} replaced={:?} debounce_ms={}",
            revision,
            replaced,
            debounce.as_millis()
        );
        self.pending = Some(PendingSync {
            revision,
            cancel: Some(cancel_tx),
            handle,
        });
    }

    /// Cancels the pending timer, returning its revision when it had not
    /// fired yet.
    pub fn cancel_pending(&mut self) -> Option<u64> {
        let pending = self.pending.take()?;
        let revision = pending.revision;
        pending.cancel().then_some(revision)
    }

    /// Cancels any pending timer and pushes `snapshot` immediately.
    pub async fn push_now(&mut self, snapshot: SyncSnapshot) -> SyncStatus {
        self.cancel_pending();
        self.worker.push(snapshot).await
    }

    /// Loads documents from the remote, or from the cache when the remote
    /// is unset, empty, failing or too slow.
    pub async fn pull(&self) -> PullOutcome {
        self.worker.pull().await
    }
}

impl SyncWorker {
    fn current_status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    fn set_status(&self, status: SyncStatus) {
        self.status.send_replace(status);
    }

    async fn push(&self, snapshot: SyncSnapshot) -> SyncStatus {
        let mut last_pushed = self.last_pushed.lock().await;
        if last_pushed.is_some_and(|last| last >= snapshot.revision) {
            debug!(
                "event=sync_push module=sync status=stale revision={} last_pushed={:?}",
                snapshot.revision, *last_pushed
            );
            return self.current_status();
        }

        let encoded = match snapshot.encode(Utc::now()) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(
                    "event=sync_push module=sync status=error revision={} error={}",
                    snapshot.revision, err
                );
                self.set_status(SyncStatus::Error);
                return SyncStatus::Error;
            }
        };

        let remote_result = match &self.remote {
            Some(remote) => {
                self.set_status(SyncStatus::Syncing);
                Some(self.put_remote(remote.as_ref(), &encoded).await)
            }
            None => None,
        };
        let cache_result = self.write_cache(&encoded.entries, &encoded.settings);

        let status = match (remote_result, cache_result) {
            (Some(Err(err)), _) => {
                warn!(
                    "event=sync_push module=sync status=error revision={} error={}",
                    encoded.revision, err
                );
                SyncStatus::Error
            }
            (_, Err(err)) => {
                error!(
                    "event=cache_write module=sync status=error revision={} error={}",
                    encoded.revision, err
                );
                SyncStatus::Error
            }
            (Some(Ok(())), Ok(())) => SyncStatus::Synced,
            (None, Ok(())) => SyncStatus::Offline,
        };

        if status != SyncStatus::Error {
            *last_pushed = Some(encoded.revision);
            info!(
                "event=sync_push module=sync status=ok revision={} result={} entries_bytes={}",
                encoded.revision,
                status.as_str(),
                encoded.entries.len()
            );
        }
        self.set_status(status);
        status
    }

    async fn put_remote(
        &self,
        remote: &dyn RemoteBlobStore,
        encoded: &EncodedSnapshot,
    ) -> StorageResult<()> {
        let entries_key = self.config.entries_key.as_str();
        let settings_key = self.config.settings_key.as_str();
        self.bounded(entries_key, remote.put(entries_key, encoded.entries.clone()))
            .await?;
        self.bounded(settings_key, remote.put(settings_key, encoded.settings.clone()))
            .await
    }

    fn write_cache(&self, entries: &[u8], settings: &[u8]) -> StorageResult<()> {
        self.cache.put(&self.config.entries_key, entries)?;
        self.cache.put(&self.config.settings_key, settings)
    }

    async fn bounded<T>(
        &self,
        key: &str,
        call: impl Future<Output = StorageResult<T>>,
    ) -> StorageResult<T> {
        let timeout = self.config.timeout();
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| StorageError::Timeout {
                key: key.to_string(),
                after_ms: timeout.as_millis(),
            })?
    }

    async fn pull(&self) -> PullOutcome {
        let Some(remote) = &self.remote else {
            return self.pull_from_cache(SyncStatus::Offline);
        };

        self.set_status(SyncStatus::Syncing);
        let fetched = self.fetch_remote(remote.as_ref()).await.and_then(|raw| {
            let state = decode_remote(&raw)?;
            Ok((raw, state))
        });

        match fetched {
            Ok((RawDocuments { entries: None, settings: None }, _)) => {
                info!("event=sync_pull module=sync status=ok source=remote result=absent");
                self.pull_from_cache(SyncStatus::Synced)
            }
            Ok((raw, state)) => {
                self.mirror_to_cache(&raw);
                info!(
                    "event=sync_pull module=sync status=ok source=remote entries={}",
                    state.store.as_ref().map_or(0, EntryStore::len)
                );
                self.set_status(SyncStatus::Synced);
                PullOutcome {
                    source: PullSource::Remote,
                    state,
                    status: SyncStatus::Synced,
                }
            }
            Err(err) => {
                warn!(
                    "event=sync_pull module=sync status=error fallback=cache error={}",
                    err
                );
                self.pull_from_cache(SyncStatus::Error)
            }
        }
    }

    async fn fetch_remote(&self, remote: &dyn RemoteBlobStore) -> StorageResult<RawDocuments> {
        let entries_key = self.config.entries_key.as_str();
        let settings_key = self.config.settings_key.as_str();
        Ok(RawDocuments {
            entries: self.bounded(entries_key, remote.get(entries_key)).await?,
            settings: self.bounded(settings_key, remote.get(settings_key)).await?,
        })
    }

    fn mirror_to_cache(&self, raw: &RawDocuments) {
        let writes = [
            (self.config.entries_key.as_str(), raw.entries.as_deref()),
            (self.config.settings_key.as_str(), raw.settings.as_deref()),
        ];
        for (key, bytes) in writes {
            let Some(bytes) = bytes else { continue };
            if let Err(err) = self.cache.put(key, bytes) {
                error!("event=cache_write module=sync status=error error={}", err);
            }
        }
    }

    fn pull_from_cache(&self, status: SyncStatus) -> PullOutcome {
        let entries = self.read_cache(&self.config.entries_key);
        let settings = self.read_cache(&self.config.settings_key);

        let store = entries.and_then(|bytes| match decode_entries(&bytes) {
            Ok(document) => Some(document.into_store()),
            Err(err) => {
                warn!("event=cache_read module=sync status=error document=entries error={}", err);
                None
            }
        });
        let titles = settings.and_then(|bytes| match decode_settings(&bytes) {
            Ok(document) => Some(document.field_titles),
            Err(err) => {
                warn!("event=cache_read module=sync status=error document=settings error={}", err);
                None
            }
        });

        let state = PulledState { store, titles };
        let source = if state.is_empty() {
            PullSource::Nothing
        } else {
            PullSource::Cache
        };
        debug!(
            "event=sync_pull module=sync status=ok source=cache found={}",
            !state.is_empty()
        );
        self.set_status(status);
        PullOutcome {
            source,
            state,
            status,
        }
    }

    fn read_cache(&self, key: &str) -> Option<Vec<u8>> {
        match self.cache.get(key) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("event=cache_read module=sync status=error error={}", err);
                None
            }
        }
    }
}

struct RawDocuments {
    entries: Option<Vec<u8>>,
    settings: Option<Vec<u8>>,
}

fn decode_remote(raw: &RawDocuments) -> StorageResult<PulledState> {
    Ok(PulledState {
        store: raw
            .entries
            .as_deref()
            .map(decode_entries)
            .transpose()?
            .map(EntriesDocument::into_store),
        titles: raw
            .settings
            .as_deref()
            .map(decode_settings)
            .transpose()?
            .map(|document| document.field_titles),
    })
}
