//! Journal entry domain model.
//!
//! # Responsibility
//! - Define the canonical per-day record and its identity (`DateKey`).
//! - Define mood ratings and the process-wide field titles.
//!
//! # Invariants
//! - `DateKey` always renders as zero-padded `YYYY-MM-DD`, so its year is
//!   confined to `0000..=9999`.
//! - `Entry::fields` always holds exactly three values.
//! - Mood values outside `1..=3` are never representable; callers coerce
//!   them to `None`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Number of free-text fields on every entry.
pub const FIELD_COUNT: usize = 3;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Years that render as four-digit `YYYY`.
const KEY_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Validation failure for user- or file-provided model values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Text is not a canonical `YYYY-MM-DD` calendar date.
    InvalidDateKey(String),
    /// Field index outside `0..FIELD_COUNT`.
    InvalidFieldIndex(usize),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDateKey(value) => {
                write!(f, "invalid date key `{value}`; expected YYYY-MM-DD")
            }
            Self::InvalidFieldIndex(index) => write!(
                f,
                "field index {index} is out of range; expected 0..{FIELD_COUNT}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Identity of one diary day.
///
/// Wall-clock naive: no timezone is attached, so the same key means the
/// same day regardless of where it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Wraps `date`, or returns `None` when its year lies outside
    /// `0000..=9999` and so has no canonical key.
    pub fn new(date: NaiveDate) -> Option<Self> {
        KEY_YEARS.contains(&date.year()).then_some(Self(date))
    }

    /// Builds a key from calendar parts, returning `None` for dates that do
    /// not exist (e.g. February 30th) or lie outside `0000..=9999`.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(Self::new)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the following day, or `self` on 9999-12-31.
    pub fn next_day(&self) -> Self {
        self.0.succ_opt().and_then(Self::new).unwrap_or(*self)
    }

    /// Returns the preceding day, or `self` on 0000-01-01.
    pub fn previous_day(&self) -> Self {
        self.0.pred_opt().and_then(Self::new).unwrap_or(*self)
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ValidationError;

    /// Parses the canonical form only. Lenient formats live in the CSV codec.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_canonical = trimmed.len() == 10
            && trimmed
                .bytes()
                .enumerate()
                .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
        if !is_canonical {
            return Err(ValidationError::InvalidDateKey(trimmed.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, DATE_KEY_FORMAT)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ValidationError::InvalidDateKey(trimmed.to_string()))
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Daily mood rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mood {
    Bad = 1,
    Neutral = 2,
    Good = 3,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Bad, Mood::Neutral, Mood::Good];

    /// Maps a raw rating to a mood; anything outside `1..=3` is unset.
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Bad),
            2 => Some(Self::Neutral),
            3 => Some(Self::Good),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Bad => "😔",
            Self::Neutral => "😐",
            Self::Good => "😊",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bad => "Bad",
            Self::Neutral => "Neutral",
            Self::Good => "Good",
        }
    }
}

/// Display pair for an optional mood, including the "not rated" case.
pub fn mood_display(mood: Option<Mood>) -> (&'static str, &'static str) {
    match mood {
        Some(mood) => (mood.emoji(), mood.label()),
        None => ("❓", "Not rated"),
    }
}

/// Typed position of one of the three entry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSlot {
    First,
    Second,
    Third,
}

impl FieldSlot {
    pub const ALL: [FieldSlot; FIELD_COUNT] = [FieldSlot::First, FieldSlot::Second, FieldSlot::Third];

    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
        }
    }
}

impl TryFrom<usize> for FieldSlot {
    type Error = ValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value)
            .copied()
            .ok_or(ValidationError::InvalidFieldIndex(value))
    }
}

/// One day of journal content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub date: DateKey,
    /// Positionally aligned with [`FieldTitles`].
    pub fields: [String; FIELD_COUNT],
    pub mood: Option<Mood>,
}

impl Entry {
    /// Creates an entry with all fields blank and mood unset.
    pub fn empty(date: DateKey) -> Self {
        Self {
            date,
            fields: Default::default(),
            mood: None,
        }
    }

    pub fn with_fields(date: DateKey, fields: [String; FIELD_COUNT], mood: Option<Mood>) -> Self {
        Self { date, fields, mood }
    }

    pub fn field(&self, slot: FieldSlot) -> &str {
        &self.fields[slot.index()]
    }

    /// An entry can exist and still be empty (created by navigation).
    pub fn is_blank(&self) -> bool {
        self.mood.is_none() && self.fields.iter().all(|field| field.is_empty())
    }
}

/// Display labels for the three fields, shared by every entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTitles([String; FIELD_COUNT]);

impl FieldTitles {
    pub fn new(titles: [String; FIELD_COUNT]) -> Self {
        Self(titles)
    }

    pub fn get(&self, slot: FieldSlot) -> &str {
        &self.0[slot.index()]
    }

    pub fn set(&mut self, slot: FieldSlot, title: impl Into<String>) {
        self.0[slot.index()] = title.into();
    }

    pub fn as_array(&self) -> &[String; FIELD_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldSlot, &str)> {
        FieldSlot::ALL
            .into_iter()
            .map(move |slot| (slot, self.get(slot)))
    }

    /// Default label for one slot (`Field 1` ...).
    pub fn default_title(slot: FieldSlot) -> String {
        format!("Field {}", slot.index() + 1)
    }
}

impl Default for FieldTitles {
    fn default() -> Self {
        Self(FieldSlot::ALL.map(Self::default_title))
    }
}

#[cfg(test)]
mod tests {
    use super::{DateKey, Entry, FieldSlot, FieldTitles, Mood, ValidationError};

    #[test]
    fn date_key_renders_zero_padded() {
        let key = DateKey::from_ymd(2024, 3, 5).expect("valid date");
        assert_eq!(key.to_string(), "2024-03-05");
    }

    #[test]
    fn date_key_parse_rejects_non_canonical_and_impossible_dates() {
        assert!(matches!(
            "2024-3-5".parse::<DateKey>(),
            Err(ValidationError::InvalidDateKey(_))
        ));
        assert!("2024-02-30".parse::<DateKey>().is_err());
        assert_eq!(
            "2024-02-29".parse::<DateKey>().expect("leap day").to_string(),
            "2024-02-29"
        );
    }

    #[test]
    fn date_key_navigation_crosses_month_boundaries() {
        let key: DateKey = "2024-02-29".parse().expect("leap day");
        assert_eq!(key.next_day().to_string(), "2024-03-01");
        assert_eq!(key.next_day().previous_day(), key);
    }

    #[test]
    fn date_key_stays_within_four_digit_years() {
        let last: DateKey = "9999-12-31".parse().expect("last canonical day");
        assert_eq!(last.next_day(), last);
        let first: DateKey = "0000-01-01".parse().expect("first canonical day");
        assert_eq!(first.previous_day(), first);

        assert_eq!(DateKey::from_ymd(10000, 1, 1), None);
        assert_eq!(DateKey::from_ymd(-1, 12, 31), None);
        let beyond = chrono::NaiveDate::from_ymd_opt(10113, 9, 19).expect("chrono date");
        assert_eq!(DateKey::new(beyond), None);
    }

    #[test]
    fn mood_from_value_coerces_out_of_range_to_none() {
        assert_eq!(Mood::from_value(1), Some(Mood::Bad));
        assert_eq!(Mood::from_value(3), Some(Mood::Good));
        assert_eq!(Mood::from_value(0), None);
        assert_eq!(Mood::from_value(4), None);
        assert_eq!(Mood::from_value(-2), None);
    }

    #[test]
    fn field_slot_rejects_out_of_range_index() {
        assert_eq!(FieldSlot::try_from(2), Ok(FieldSlot::Third));
        assert_eq!(
            FieldSlot::try_from(3),
            Err(ValidationError::InvalidFieldIndex(3))
        );
    }

    #[test]
    fn empty_entry_is_blank_until_written() {
        let key = DateKey::from_ymd(2024, 1, 1).expect("valid date");
        let mut entry = Entry::empty(key);
        assert!(entry.is_blank());
        entry.mood = Some(Mood::Neutral);
        assert!(!entry.is_blank());
    }

    #[test]
    fn default_titles_are_numbered() {
        let titles = FieldTitles::default();
        assert_eq!(titles.get(FieldSlot::First), "Field 1");
        assert_eq!(titles.get(FieldSlot::Third), "Field 3");
    }
}
