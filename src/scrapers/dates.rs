//! Normalization of loosely formatted datelines.
//!
//! Article headers carry the date inside free text such as
//! `"Published: March 3, 2024 at 5:00 AM ET"`. The first
//! `"<word> <day>, <year>"` run is located and parsed with [`DATE_FORMAT`].

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Word, space, 1-2 digit day, comma, space, 4 digit year.
pub const DATE_PATTERN: &str = r"\w+ \d{1,2}, \d{4}";

/// Layout of the matched text. chrono's `%B` accepts both "January" and
/// "Jan" when parsing.
pub const DATE_FORMAT: &str = "%B %d, %Y";

/// Output layout.
pub const NORMALIZED_FORMAT: &str = "%Y-%m-%d";

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DATE_PATTERN).expect("valid date regex"));

/// Why a dateline could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Nothing in the text looks like a date.
    NoMatch,
    /// The matched text is not a real calendar date (bad month, day 31 in
    /// April and the like).
    Unparseable(String),
}

impl std::fmt::Display for DateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateError::NoMatch => f.write_str("no date found in dateline"),
            DateError::Unparseable(text) => write!(f, "unrecognised date {text:?}"),
        }
    }
}

/// Find the first date in `text` and return it as `YYYY-MM-DD`.
pub fn normalize_date(text: &str) -> Result<String, DateError> {
    let matched = DATE_RE.find(text).ok_or(DateError::NoMatch)?.as_str();

    NaiveDate::parse_from_str(matched, DATE_FORMAT)
        .map(|date| date.format(NORMALIZED_FORMAT).to_string())
        .map_err(|_| DateError::Unparseable(matched.to_string()))
}
