//! Persisted sync documents.
//!
//! # Responsibility
//! - Define the JSON wire shape written to remote and local blob stores.
//! - Convert between documents and in-memory state.
//!
//! # Invariants
//! - Only documents with `version == "1.0"` are accepted.
//! - Mood values outside `1..=3` decode as unset.
//! - Entry keys that are not canonical `YYYY-MM-DD` are dropped on decode;
//!   the remaining entries still load.

use crate::model::entry::{DateKey, Entry, FieldTitles, Mood};
use crate::store::entry_store::EntryStore;
use crate::sync::blob::{StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Schema version written into every document.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Wire form of one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    #[serde(default)]
    pub field1: String,
    #[serde(default)]
    pub field2: String,
    #[serde(default)]
    pub field3: String,
    #[serde(default, deserialize_with = "lenient_mood")]
    pub mood: Option<u8>,
}

impl StoredEntry {
    fn from_entry(entry: &Entry) -> Self {
        let [field1, field2, field3] = entry.fields.clone();
        Self {
            field1,
            field2,
            field3,
            mood: entry.mood.map(Mood::value),
        }
    }

    fn into_entry(self, date: DateKey) -> Entry {
        Entry::with_fields(
            date,
            [self.field1, self.field2, self.field3],
            self.mood.and_then(|value| Mood::from_value(i64::from(value))),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesDocument {
    #[serde(deserialize_with = "entries_with_valid_keys")]
    pub entries: BTreeMap<DateKey, StoredEntry>,
    /// RFC 3339 timestamp of the write.
    pub last_modified: String,
    pub version: String,
}

impl EntriesDocument {
    pub fn from_store(store: &EntryStore, now: DateTime<Utc>) -> Self {
        Self {
            entries: store
                .iter()
                .map(|entry| (entry.date, StoredEntry::from_entry(entry)))
                .collect(),
            last_modified: timestamp(now),
            version: DOCUMENT_VERSION.to_string(),
        }
    }

    pub fn into_store(self) -> EntryStore {
        EntryStore::from_entries(
            self.entries
                .into_iter()
                .map(|(date, stored)| stored.into_entry(date)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDocument {
    pub field_titles: FieldTitles,
    pub last_modified: String,
    pub version: String,
}

impl SettingsDocument {
    pub fn new(titles: &FieldTitles, now: DateTime<Utc>) -> Self {
        Self {
            field_titles: titles.clone(),
            last_modified: timestamp(now),
            version: DOCUMENT_VERSION.to_string(),
        }
    }
}

/// Journal state captured for one outbound sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// Journal revision this state was taken from.
    pub revision: u64,
    pub store: EntryStore,
    pub titles: FieldTitles,
}

/// Both documents serialized and ready to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSnapshot {
    pub revision: u64,
    pub entries: Vec<u8>,
    pub settings: Vec<u8>,
}

impl SyncSnapshot {
    pub fn encode(&self, now: DateTime<Utc>) -> StorageResult<EncodedSnapshot> {
        let entries = serde_json::to_vec(&EntriesDocument::from_store(&self.store, now))
            .map_err(|err| StorageError::Encode(err.to_string()))?;
        let settings = serde_json::to_vec(&SettingsDocument::new(&self.titles, now))
            .map_err(|err| StorageError::Encode(err.to_string()))?;
        Ok(EncodedSnapshot {
            revision: self.revision,
            entries,
            settings,
        })
    }
}

pub fn decode_entries(bytes: &[u8]) -> StorageResult<EntriesDocument> {
    let document: EntriesDocument =
        serde_json::from_slice(bytes).map_err(|err| StorageError::Decode(err.to_string()))?;
    check_version(&document.version)?;
    Ok(document)
}

pub fn decode_settings(bytes: &[u8]) -> StorageResult<SettingsDocument> {
    let document: SettingsDocument =
        serde_json::from_slice(bytes).map_err(|err| StorageError::Decode(err.to_string()))?;
    check_version(&document.version)?;
    Ok(document)
}

fn check_version(version: &str) -> StorageResult<()> {
    if version != DOCUMENT_VERSION {
        return Err(StorageError::Decode(format!(
            "unsupported document version `{version}`; expected `{DOCUMENT_VERSION}`"
        )));
    }
    Ok(())
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn entries_with_valid_keys<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<DateKey, StoredEntry>, D::Error> {
    let raw = BTreeMap::<String, StoredEntry>::deserialize(deserializer)?;
    let total = raw.len();
    let entries: BTreeMap<DateKey, StoredEntry> = raw
        .into_iter()
        .filter_map(|(key, stored)| key.parse().ok().map(|date| (date, stored)))
        .collect();
    if entries.len() < total {
        warn!(
            "event=document_decode module=sync status=partial entries={} dropped_keys={}",
            total,
            total - entries.len()
        );
    }
    Ok(entries)
}

/// Accepts integers, integral floats, numeric strings and null; anything
/// else, or a value outside `1..=3`, becomes `None`.
fn lenient_mood<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    let value = match raw {
        serde_json::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        serde_json::Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(value.and_then(Mood::from_value).map(Mood::value))
}

#[cfg(test)]
mod tests {
    use super::{decode_entries, decode_settings, SyncSnapshot};
    use crate::model::entry::{DateKey, Entry, FieldTitles, Mood};
    use crate::store::entry_store::EntryStore;
    use crate::sync::blob::StorageError;
    use chrono::{TimeZone, Utc};

    fn day(value: &str) -> DateKey {
        value.parse().expect("canonical test date")
    }

    #[test]
    fn documents_use_expected_wire_fields() {
        let snapshot = SyncSnapshot {
            revision: 4,
            store: EntryStore::from_entries(vec![Entry::with_fields(
                day("2024-03-05"),
                ["a".into(), "b".into(), "c".into()],
                Some(Mood::Neutral),
            )]),
            titles: FieldTitles::default(),
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let encoded = snapshot.encode(now).expect("encode");

        let entries: serde_json::Value = serde_json::from_slice(&encoded.entries).unwrap();
        assert_eq!(entries["version"], "1.0");
        assert_eq!(entries["lastModified"], "2024-03-05T12:00:00.000Z");
        assert_eq!(entries["entries"]["2024-03-05"]["field2"], "b");
        assert_eq!(entries["entries"]["2024-03-05"]["mood"], 2);

        let settings: serde_json::Value = serde_json::from_slice(&encoded.settings).unwrap();
        assert_eq!(settings["fieldTitles"][0], "Field 1");
        assert_eq!(encoded.revision, 4);
    }

    #[test]
    fn decode_coerces_bad_moods_and_missing_fields() {
        let bytes = br#"{
            "entries": {
                "2024-01-01": { "field1": "x", "mood": 7 },
                "2024-01-02": { "field1": "y", "mood": "3" },
                "2024-01-03": { "mood": null }
            },
            "lastModified": "2024-01-03T00:00:00Z",
            "version": "1.0"
        }"#;
        let store = decode_entries(bytes).expect("decode").into_store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(day("2024-01-01")).mood, None);
        assert_eq!(store.get(day("2024-01-02")).mood, Some(Mood::Good));
        assert!(store.get(day("2024-01-03")).is_blank());
    }

    #[test]
    fn decode_drops_unreadable_keys_and_keeps_the_rest() {
        let bytes = br#"{
            "entries": {
                "+10113-09-19": { "field1": "lost" },
                "2024-02-30": { "field1": "impossible" },
                "2024-01-01": { "field1": "kept", "mood": 1 }
            },
            "lastModified": "2024-01-03T00:00:00Z",
            "version": "1.0"
        }"#;
        let store = decode_entries(bytes).expect("decode").into_store();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(day("2024-01-01")).fields[0], "kept");
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let bytes = br#"{"fieldTitles":["a","b","c"],"lastModified":"","version":"2.0"}"#;
        assert!(matches!(
            decode_settings(bytes),
            Err(StorageError::Decode(_))
        ));
    }
}
