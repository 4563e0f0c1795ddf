//! Freshness threshold for the conditional index fetch.
//!
//! The origin is asked for the index with an `If-Modified-Since` header whose
//! value must follow the HTTP date layout exactly:
//! `"<Weekday>, <DD> <Mon> <YYYY> <HH>:<MM>:<SS> GMT"`, always in UTC.

use crate::error::{CrawlError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fmt;

/// `strftime` layout of an HTTP date.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// An absolute UTC point in time used as the "modified since" bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessThreshold(DateTime<Utc>);

impl FreshnessThreshold {
    #[cfg(test)]
    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// The wire form sent as the `If-Modified-Since` header value.
    pub fn header_value(&self) -> String {
        self.0.format(HTTP_DATE_FORMAT).to_string()
    }

    /// Parse a header value produced by [`FreshnessThreshold::header_value`].
    #[cfg(test)]
    pub fn parse(value: &str) -> Result<Self> {
        chrono::NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
            .map(|naive| Self(naive.and_utc()))
            .map_err(|e| CrawlError::InvalidArgument(format!("not an HTTP date {value:?}: {e}")))
    }
}

impl fmt::Display for FreshnessThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

/// Compute `now - minutes_ago` as a [`FreshnessThreshold`].
///
/// `now` may be in any zone; the result is always UTC. Sub-second precision
/// is dropped because the wire format cannot carry it.
///
/// # Errors
///
/// [`CrawlError::InvalidArgument`] if `minutes_ago` is negative or so large
/// that the subtraction leaves the representable range.
pub fn compute_threshold<Tz: TimeZone>(
    minutes_ago: i64,
    now: DateTime<Tz>,
) -> Result<FreshnessThreshold> {
    if minutes_ago < 0 {
        return Err(CrawlError::InvalidArgument(format!(
            "minutes ago must be non-negative, got {minutes_ago}"
        )));
    }

    let out_of_range =
        || CrawlError::InvalidArgument(format!("{minutes_ago} minutes ago is out of range"));

    let delta = Duration::try_minutes(minutes_ago).ok_or_else(out_of_range)?;
    let instant = now
        .with_timezone(&Utc)
        .checked_sub_signed(delta)
        .ok_or_else(out_of_range)?;

    let truncated = Utc
        .timestamp_opt(instant.timestamp(), 0)
        .single()
        .ok_or_else(out_of_range)?;

    tracing::debug!(minutes_ago, threshold = %truncated.format(HTTP_DATE_FORMAT), "Computed freshness threshold");
    Ok(FreshnessThreshold(truncated))
}
