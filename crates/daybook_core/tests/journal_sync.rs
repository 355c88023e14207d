use daybook_core::sync::document::decode_entries;
use daybook_core::{
    DateKey, FieldSlot, Journal, JournalCommand, LocalCache, MemoryBlobStore, Mood, PullSource,
    RemoteBlobStore, RemoteRegistry, SearchConfig, SqliteLocalCache, SyncConfig, SyncReconciler,
    SyncStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

fn day(value: &str) -> DateKey {
    value.parse().unwrap()
}

fn sync_config() -> SyncConfig {
    SyncConfig {
        debounce_ms: 1_000,
        timeout_ms: 2_000,
        ..SyncConfig::default()
    }
}

fn journal_with(remote: Option<Arc<MemoryBlobStore>>, cache: Arc<dyn LocalCache>) -> Journal {
    let mut sync = SyncReconciler::new(Handle::current(), cache, sync_config());
    sync.set_remote(remote.map(|r| r as Arc<dyn RemoteBlobStore>));
    Journal::new(day("2024-03-05"), &SearchConfig::default()).with_sync(sync)
}

fn write_field(journal: &mut Journal, date: &str, value: &str) {
    journal.apply(JournalCommand::UpdateField {
        date: day(date),
        slot: FieldSlot::First,
        value: value.into(),
    });
}

#[tokio::test(start_paused = true)]
async fn two_quick_edits_produce_one_push_with_later_revision() {
    let remote = Arc::new(MemoryBlobStore::new("remote"));
    let cache = Arc::new(SqliteLocalCache::open_in_memory().unwrap());
    let mut journal = journal_with(Some(remote.clone()), cache);

    write_field(&mut journal, "2024-03-05", "first");
    tokio::time::sleep(Duration::from_millis(300)).await;
    write_field(&mut journal, "2024-03-06", "second");
    assert_eq!(journal.revision(), 2);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(remote.put_count(), 2);
    let document = decode_entries(&remote.read("daybook_entries.json").unwrap()).unwrap();
    assert_eq!(document.entries.len(), 2);
    assert_eq!(journal.sync_status(), SyncStatus::Synced);
}

#[tokio::test(start_paused = true)]
async fn failed_remote_keeps_state_and_writes_cache() {
    let remote = Arc::new(MemoryBlobStore::new("remote"));
    remote.set_offline(true);
    let cache = Arc::new(SqliteLocalCache::open_in_memory().unwrap());
    let mut journal = journal_with(Some(remote.clone()), cache.clone());

    journal.apply(JournalCommand::SetMood {
        date: day("2024-03-05"),
        mood: Some(Mood::Neutral),
    });
    assert_eq!(journal.flush().await, SyncStatus::Error);

    assert_eq!(journal.current_entry().mood, Some(Mood::Neutral));
    let cached = cache.get("daybook_entries.json").unwrap().unwrap();
    assert_eq!(decode_entries(&cached).unwrap().entries.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn refresh_loads_remote_state_into_fresh_session() {
    let remote = Arc::new(MemoryBlobStore::new("remote"));
    let first_cache = Arc::new(MemoryBlobStore::new("cache-a"));
    let mut writer = journal_with(Some(remote.clone()), first_cache);
    write_field(&mut writer, "2024-02-01", "from another device");
    assert_eq!(writer.flush().await, SyncStatus::Synced);

    let second_cache = Arc::new(MemoryBlobStore::new("cache-b"));
    let mut reader = journal_with(Some(remote), second_cache.clone());
    let outcome = reader.refresh().await;

    assert_eq!(outcome.source, PullSource::Remote);
    assert!(outcome.applied);
    assert_eq!(
        reader.entry(day("2024-02-01")).field(FieldSlot::First),
        "from another device"
    );
    assert!(second_cache.read("daybook_entries.json").is_some());
}

#[tokio::test(start_paused = true)]
async fn pull_started_before_edit_is_discarded() {
    let remote = Arc::new(MemoryBlobStore::new("remote"));
    let mut other_device = journal_with(Some(remote.clone()), Arc::new(MemoryBlobStore::new("a")));
    write_field(&mut other_device, "2024-03-05", "older remote text");
    assert_eq!(other_device.flush().await, SyncStatus::Synced);

    let mut journal = journal_with(Some(remote), Arc::new(MemoryBlobStore::new("b")));
    let ticket = journal.begin_pull();
    let pulled = journal.sync().unwrap().pull().await;
    assert_eq!(pulled.source, PullSource::Remote);
    write_field(&mut journal, "2024-03-05", "typed while loading");

    assert!(!journal.apply_pull(ticket, pulled.state));
    assert_eq!(
        journal.current_entry().field(FieldSlot::First),
        "typed while loading"
    );
}

#[tokio::test(start_paused = true)]
async fn offline_session_round_trips_through_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.sqlite3");

    let cache = Arc::new(SqliteLocalCache::open(&path).unwrap());
    let mut journal = journal_with(None, cache);
    write_field(&mut journal, "2024-04-04", "offline note");
    assert_eq!(journal.flush().await, SyncStatus::Offline);
    drop(journal);

    let cache = Arc::new(SqliteLocalCache::open(&path).unwrap());
    let mut reopened = journal_with(None, cache);
    let outcome = reopened.refresh().await;
    assert_eq!(outcome.source, PullSource::Cache);
    assert!(outcome.applied);
    assert_eq!(
        reopened.entry(day("2024-04-04")).field(FieldSlot::First),
        "offline note"
    );
}

#[tokio::test(start_paused = true)]
async fn pushes_go_to_the_registry_active_remote() {
    let google = Arc::new(MemoryBlobStore::new("google_drive"));
    let onedrive = Arc::new(MemoryBlobStore::new("onedrive"));
    let mut registry = RemoteRegistry::new();
    registry.register(google.clone()).unwrap();
    registry.register(onedrive.clone()).unwrap();
    registry.select_active("onedrive").unwrap();

    let mut journal = journal_with(None, Arc::new(MemoryBlobStore::new("cache")));
    journal.sync_mut().unwrap().follow_active(&registry);
    write_field(&mut journal, "2024-03-05", "routed");
    assert_eq!(journal.flush().await, SyncStatus::Synced);
    assert_eq!((google.put_count(), onedrive.put_count()), (0, 2));

    registry.clear_active();
    journal.sync_mut().unwrap().follow_active(&registry);
    assert_eq!(journal.sync_status(), SyncStatus::Offline);
}
