//! Spreadsheet interchange (CSV import/export).
//!
//! # Responsibility
//! - Convert between the entry store and CSV text.
//! - Parse the date formats spreadsheets tend to produce.
//!
//! # See also
//! - `csv_codec` for the file layout.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::string::FromUtf8Error;

pub mod csv_codec;
pub mod dates;

pub type InterchangeResult<T> = Result<T, InterchangeError>;

/// Failure that prevents a whole import or export.
///
/// Per-row problems are not errors; they are reported as skipped rows.
#[derive(Debug)]
pub enum InterchangeError {
    /// Input had no header row or no data rows.
    Empty,
    Csv(csv::Error),
    Io(std::io::Error),
    Encoding(FromUtf8Error),
}

impl Display for InterchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "csv input is empty or has no data rows"),
            Self::Csv(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Encoding(err) => write!(f, "csv output is not valid UTF-8: {err}"),
        }
    }
}

impl Error for InterchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty => None,
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Encoding(err) => Some(err),
        }
    }
}

impl From<csv::Error> for InterchangeError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<std::io::Error> for InterchangeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
