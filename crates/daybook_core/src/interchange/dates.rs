//! Lenient date parsing for spreadsheet imports.
//!
//! Formats are tried in order and the first one that matches the shape wins:
//! ISO `YYYY-M-D`, day-first `D.M.YYYY` / `D/M/YYYY`, then a bare
//! spreadsheet serial number (days since 1899-12-30).

use crate::model::entry::DateKey;
use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid iso date regex"));
static DAY_FIRST_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[./](\d{1,2})[./](\d{4})$").expect("valid day-first date regex")
});
static SERIAL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid serial date regex"));

/// Parses one date cell into a canonical key.
///
/// Returns `None` for unknown shapes and for shapes that name a day that
/// does not exist (e.g. `2024-02-30`).
pub fn parse_date(raw: &str) -> Option<DateKey> {
    let cleaned = raw.replace('"', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE_RE.captures(cleaned) {
        return from_parts(&caps[1], &caps[2], &caps[3]);
    }
    if let Some(caps) = DAY_FIRST_DATE_RE.captures(cleaned) {
        return from_parts(&caps[3], &caps[2], &caps[1]);
    }
    if SERIAL_DATE_RE.is_match(cleaned) {
        return from_serial(cleaned);
    }
    None
}

/// Converts a spreadsheet serial day number to a date.
///
/// The fractional part is a time of day and is dropped. Serials of 1 and
/// below fall before any real diary date and are rejected, as are serials
/// past 9999-12-31.
pub fn from_serial(raw: &str) -> Option<DateKey> {
    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() || value <= 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch
        .checked_add_days(Days::new(value.trunc() as u64))
        .and_then(DateKey::new)
}

fn from_parts(year: &str, month: &str, day: &str) -> Option<DateKey> {
    DateKey::from_ymd(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}
