use chrono::Utc;
use daybook_core::sync::document::{decode_entries, SyncSnapshot};
use daybook_core::{
    export_csv, import_csv, DateKey, Entry, EntryStore, FieldSlot, FieldTitles,
    InterchangeError, Mood, SkipReason,
};

fn day(value: &str) -> DateKey {
    value.parse().unwrap()
}

#[test]
fn round_trip_into_empty_store_reproduces_entries() {
    let store = EntryStore::from_entries(vec![
        Entry::with_fields(
            day("2024-03-05"),
            ["said \"hi\"".into(), "a, b".into(), "line one\nline two".into()],
            Some(Mood::Good),
        ),
        Entry::with_fields(
            day("2023-12-31"),
            ["  indented".into(), "trailing \n".into(), " ".into()],
            None,
        ),
    ]);
    let mut titles = FieldTitles::default();
    titles.set(FieldSlot::First, "Gratitude");

    let text = export_csv(&store, &titles).unwrap();
    let batch = import_csv(&text).unwrap();
    assert_eq!(batch.field_titles.as_ref(), Some(&titles));
    assert!(batch.skipped.is_empty());

    let mut restored = EntryStore::new();
    let report = batch.merge_into(&mut restored);
    assert_eq!(report.imported, 2);
    assert_eq!(restored, store);
    assert_eq!(
        restored.get(day("2023-12-31")).fields,
        ["  indented".to_string(), "trailing \n".to_string(), " ".to_string()]
    );
}

#[test]
fn out_of_range_serial_is_skipped_and_store_still_syncs() {
    let batch = import_csv("Date,A,B,C,Mood
3000000,x,y,z,1
2024-01-01,a,b,c,2
").unwrap();
    assert_eq!(
        batch.skipped[0].reason,
        SkipReason::InvalidDate("3000000".to_string())
    );
    assert_eq!(batch.skipped[0].line, 2);

    let mut store = EntryStore::new();
    assert_eq!(batch.merge_into(&mut store).imported, 1);

    let snapshot = SyncSnapshot {
        revision: 1,
        store: store.clone(),
        titles: FieldTitles::default(),
    };
    let encoded = snapshot.encode(Utc::now()).unwrap();
    let decoded = decode_entries(&encoded.entries).unwrap().into_store();
    assert_eq!(decoded, store);
}

#[test]
fn supported_date_formats_normalize_to_iso() {
    let text = "Date,A,B,C,Mood\n\
                2024-03-05,iso,,,1\n\
                5.3.2024,dotted,,,2\n\
                05/03/2024,slashed,,,3\n\
                45000,serial,,,\n\
                not-a-date,bad,,,\n";
    let batch = import_csv(text).unwrap();

    let dates: Vec<String> = batch.entries.iter().map(|e| e.date.to_string()).collect();
    assert_eq!(
        dates,
        vec!["2024-03-05", "2024-03-05", "2024-03-05", "2023-03-15"]
    );
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(
        batch.skipped[0].reason,
        SkipReason::InvalidDate("not-a-date".to_string())
    );

    // Same date three times in one file: the first row wins.
    let mut store = EntryStore::new();
    let report = batch.merge_into(&mut store);
    assert_eq!(report.imported, 2);
    assert_eq!(report.already_present, 2);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(store.get(day("2024-03-05")).field(FieldSlot::First), "iso");
    assert_eq!(store.get(day("2024-03-05")).mood, Some(Mood::Bad));
}

#[test]
fn import_never_overwrites_existing_days() {
    let mut store = EntryStore::from_entries(vec![Entry::with_fields(
        day("2024-01-01"),
        ["mine".into(), String::new(), String::new()],
        None,
    )]);
    let batch = import_csv("Date,A,B,C,Mood\n2024-01-01,theirs,,,3\n2024-01-02,new,,,9\n").unwrap();
    let report = batch.merge_into(&mut store);

    assert_eq!((report.imported, report.already_present), (1, 1));
    assert_eq!(store.get(day("2024-01-01")).field(FieldSlot::First), "mine");
    assert_eq!(store.get(day("2024-01-02")).mood, None);
}

#[test]
fn short_rows_are_reported_with_their_own_reason() {
    let batch = import_csv("Date,A,B,C\n2024-01-01,only,two\n2024-01-02,a,b,c\n").unwrap();
    assert_eq!(batch.entries.len(), 1);
    assert_eq!(batch.skipped[0].reason, SkipReason::TooFewColumns(3));
    assert_eq!(batch.skipped[0].line, 2);
}

#[test]
fn empty_and_header_only_inputs_are_rejected() {
    assert!(matches!(import_csv(""), Err(InterchangeError::Empty)));
    assert!(matches!(import_csv("\u{feff}"), Err(InterchangeError::Empty)));
    assert!(matches!(
        import_csv("Date,A,B,C,Mood\n"),
        Err(InterchangeError::Empty)
    ));
}
