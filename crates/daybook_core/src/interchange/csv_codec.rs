//! CSV export and non-destructive CSV import.
//!
//! # Responsibility
//! - Serialize the store as a BOM-prefixed, fully quoted CSV document.
//! - Parse CSV back into entries, adopting field titles from the header.
//!
//! # Invariants
//! - Export rows are ascending by date.
//! - Import never replaces an existing date; it only fills gaps.
//! - A bad row is skipped with a reason; it never aborts the import.
//! - Field text is imported exactly as quoted; only date, mood and header
//!   cells are trimmed.

use crate::interchange::dates::parse_date;
use crate::interchange::{InterchangeError, InterchangeResult};
use crate::model::entry::{Entry, FieldSlot, FieldTitles, Mood, FIELD_COUNT};
use crate::store::entry_store::EntryStore;
use chrono::NaiveDate;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};
use log::{info, warn};
use std::fmt::{Display, Formatter};

/// Header label of the first column.
pub const DATE_COLUMN_LABEL: &str = "Date";
/// Header label of the last column.
pub const MOOD_COLUMN_LABEL: &str = "Mood";

const BYTE_ORDER_MARK: char = '\u{feff}';
const MIN_COLUMNS: usize = 1 + FIELD_COUNT;
const MOOD_COLUMN: usize = MIN_COLUMNS;

/// Why one data row was not turned into an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Row had fewer than date + three field columns.
    TooFewColumns(usize),
    /// Date cell matched none of the supported formats.
    InvalidDate(String),
    /// Tokenizer could not read the row.
    Malformed(String),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewColumns(found) => {
                write!(f, "expected at least {MIN_COLUMNS} columns, found {found}")
            }
            Self::InvalidDate(raw) => write!(f, "unsupported date format `{raw}`"),
            Self::Malformed(message) => write!(f, "malformed row: {message}"),
        }
    }
}

/// One skipped data row with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: SkipReason,
}

/// Parsed CSV content, not yet merged into a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    /// Candidate entries in file order.
    pub entries: Vec<Entry>,
    pub skipped: Vec<SkippedRow>,
    /// Titles taken from the header, when it had enough columns.
    pub field_titles: Option<FieldTitles>,
}

impl ImportBatch {
    /// Merges all candidates in one call and summarizes the outcome.
    pub fn merge_into(self, store: &mut EntryStore) -> ImportReport {
        let outcome = store.merge(self.entries);
        ImportReport {
            imported: outcome.inserted,
            already_present: outcome.skipped,
            skipped: self.skipped,
            new_field_titles: self.field_titles,
        }
    }
}

/// User-facing summary of one import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Entries inserted for previously absent dates.
    pub imported: usize,
    /// Valid rows whose date was already stored (left untouched).
    pub already_present: usize,
    /// Rows that could not be read.
    pub skipped: Vec<SkippedRow>,
    pub new_field_titles: Option<FieldTitles>,
}

impl ImportReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Serializes the store as CSV text, BOM included.
pub fn export_csv(store: &EntryStore, titles: &FieldTitles) -> InterchangeResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header = vec![DATE_COLUMN_LABEL];
    header.extend(titles.as_array().iter().map(String::as_str));
    header.push(MOOD_COLUMN_LABEL);
    writer.write_record(&header)?;

    for entry in store {
        let date = entry.date.to_string();
        let mood = entry
            .mood
            .map(|mood| mood.value().to_string())
            .unwrap_or_default();
        let mut row = vec![date.as_str()];
        row.extend(entry.fields.iter().map(String::as_str));
        row.push(mood.as_str());
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| InterchangeError::Io(err.into_error()))?;
    let body = String::from_utf8(bytes).map_err(InterchangeError::Encoding)?;

    info!(
        "event=csv_export module=interchange status=ok rows={}",
        store.len()
    );
    Ok(format!("{BYTE_ORDER_MARK}{body}"))
}

/// Default download name for an export made on `today`.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("journal_export_{}.csv", today.format("%Y-%m-%d"))
}

/// Parses CSV text into an import batch.
///
/// # Errors
/// - Returns [`InterchangeError::Empty`] when there is no header or no data row.
pub fn import_csv(text: &str) -> InterchangeResult<ImportBatch> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(text.as_bytes());

    let mut header: Option<StringRecord> = None;
    let mut data_rows = 0usize;
    let mut batch = ImportBatch::default();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map_or(0, |pos| pos.line());
                batch.skipped.push(SkippedRow {
                    line,
                    reason: SkipReason::Malformed(err.to_string()),
                });
                data_rows += 1;
                continue;
            }
        };
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if header.is_none() {
            header = Some(record);
            continue;
        }

        data_rows += 1;
        let line = record.position().map_or(0, |pos| pos.line());
        match parse_row(&record) {
            Ok(entry) => batch.entries.push(entry),
            Err(reason) => batch.skipped.push(SkippedRow { line, reason }),
        }
    }

    let Some(header) = header else {
        return Err(InterchangeError::Empty);
    };
    if data_rows == 0 {
        return Err(InterchangeError::Empty);
    }
    batch.field_titles = titles_from_header(&header);

    if !batch.skipped.is_empty() {
        warn!(
            "event=csv_import module=interchange status=partial rows={} skipped={}",
            data_rows,
            batch.skipped.len()
        );
    }
    info!(
        "event=csv_import module=interchange status=ok rows={} parsed={} titles_adopted={}",
        data_rows,
        batch.entries.len(),
        batch.field_titles.is_some()
    );
    Ok(batch)
}

fn titles_from_header(header: &StringRecord) -> Option<FieldTitles> {
    if header.len() < MIN_COLUMNS {
        return None;
    }
    let titles = FieldSlot::ALL.map(|slot| match header.get(slot.index() + 1) {
        Some(title) if !title.trim().is_empty() => title.trim().to_string(),
        _ => FieldTitles::default_title(slot),
    });
    Some(FieldTitles::new(titles))
}

fn parse_row(record: &StringRecord) -> Result<Entry, SkipReason> {
    if record.len() < MIN_COLUMNS {
        return Err(SkipReason::TooFewColumns(record.len()));
    }
    let raw_date = record.get(0).unwrap_or_default();
    let date = parse_date(raw_date).ok_or_else(|| SkipReason::InvalidDate(raw_date.to_string()))?;
    let fields = FieldSlot::ALL.map(|slot| {
        record
            .get(slot.index() + 1)
            .unwrap_or_default()
            .to_string()
    });
    let mood = record.get(MOOD_COLUMN).and_then(parse_mood);
    Ok(Entry::with_fields(date, fields, mood))
}

/// Non-numeric, fractional and out-of-range ratings become unset.
fn parse_mood(raw: &str) -> Option<Mood> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    Mood::from_value(value as i64)
}

#[cfg(test)]
mod tests {
    use super::{export_csv, export_file_name, import_csv, SkipReason};
    use crate::interchange::InterchangeError;
    use crate::model::entry::{DateKey, Entry, FieldSlot, FieldTitles, Mood};
    use crate::store::entry_store::EntryStore;
    use chrono::NaiveDate;

    fn day(value: &str) -> DateKey {
        value.parse().expect("canonical test date")
    }

    #[test]
    fn export_writes_bom_header_and_quoted_rows() {
        let store = EntryStore::from_entries(vec![
            Entry::with_fields(
                day("2024-02-01"),
                ["b".to_string(), String::new(), "said \"hi\"".to_string()],
                None,
            ),
            Entry::with_fields(
                day("2024-01-01"),
                ["a".to_string(), "x".to_string(), "y".to_string()],
                Some(Mood::Good),
            ),
        ]);
        let titles = FieldTitles::new(["Sport".into(), "Food".into(), "Notes".into()]);

        let csv = export_csv(&store, &titles).expect("export should succeed");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "\u{feff}\"Date\",\"Sport\",\"Food\",\"Notes\",\"Mood\"");
        assert_eq!(lines[1], "\"2024-01-01\",\"a\",\"x\",\"y\",\"3\"");
        assert_eq!(lines[2], "\"2024-02-01\",\"b\",\"\",\"said \"\"hi\"\"\",\"\"");
    }

    #[test]
    fn import_reads_mixed_date_formats_and_titles() {
        let text = "Datum,Sport,Essen,Notizen,Stimmung\n\
                    \"5.3.2024\",\"Laufen\",\"Pasta\",\"\",\"3\"\n\
                    2024-3-6,Rad,,,9\n\
                    45000,x,y,z\n\
                    not-a-date,a,b,c,1\n\
                    2024-03-08,only\n";
        let batch = import_csv(text).expect("import should parse");

        let titles = batch.field_titles.clone().expect("header has titles");
        assert_eq!(titles.get(FieldSlot::First), "Sport");
        assert_eq!(titles.get(FieldSlot::Third), "Notizen");

        let dates: Vec<String> = batch.entries.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-05", "2024-03-06", "2023-03-15"]);
        assert_eq!(batch.entries[0].mood, Some(Mood::Good));
        assert_eq!(batch.entries[1].mood, None);
        assert_eq!(batch.entries[2].mood, None);

        assert_eq!(batch.skipped.len(), 2);
        assert_eq!(
            batch.skipped[0].reason,
            SkipReason::InvalidDate("not-a-date".to_string())
        );
        assert_eq!(batch.skipped[0].line, 5);
        assert_eq!(batch.skipped[1].reason, SkipReason::TooFewColumns(2));
    }

    #[test]
    fn import_does_not_overwrite_existing_dates() {
        let mut store = EntryStore::from_entries(vec![Entry::empty(day("2024-03-05"))]);
        let batch = import_csv("Date,A,B,C,Mood\n2024-03-05,new,new,new,1\n2024-03-06,n,n,n,2\n")
            .expect("import should parse");
        let report = batch.merge_into(&mut store);

        assert_eq!(report.imported, 1);
        assert_eq!(report.already_present, 1);
        assert_eq!(report.skipped_count(), 0);
        assert!(store.get(day("2024-03-05")).is_blank());
        assert_eq!(store.get(day("2024-03-06")).mood, Some(Mood::Neutral));
    }

    #[test]
    fn empty_header_cells_fall_back_to_default_titles() {
        let batch = import_csv("Date,,Food,,Mood\n2024-01-01,a,b,c\n").expect("import");
        let titles = batch.field_titles.expect("titles adopted");
        assert_eq!(titles.get(FieldSlot::First), "Field 1");
        assert_eq!(titles.get(FieldSlot::Second), "Food");
    }

    #[test]
    fn header_only_or_blank_input_is_empty() {
        assert!(matches!(import_csv(""), Err(InterchangeError::Empty)));
        assert!(matches!(
            import_csv("\u{feff}Date,A,B,C,Mood\n\n"),
            Err(InterchangeError::Empty)
        ));
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let today = NaiveDate::from_ymd_opt(2024, 7, 9).expect("valid date");
        assert_eq!(export_file_name(today), "journal_export_2024-07-09.csv");
    }
}
