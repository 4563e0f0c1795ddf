//! Data models for discovered and extracted articles.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleRecord`]: The three extracted fields of a single article
//! - [`DiscoveryResult`]: What the conditional index fetch found
//! - [`RunReport`]: Records plus per-article failures for one pipeline run
//!
//! [`ArticleRecord`] serializes with the column names of the exported table
//! (`headline`, `author_name`, `publication date`), which is why its serde
//! names differ from the Rust field names.

use crate::clock::FreshnessThreshold;
use crate::error::CrawlError;
use serde::{Deserialize, Serialize};

/// A single article's extracted metadata.
///
/// Every field is non-empty once extraction succeeds; a page that cannot
/// supply all three is an extraction failure rather than a partial record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The article headline.
    #[serde(rename = "headline")]
    pub title: String,
    /// The byline with any leading `"By "` removed.
    #[serde(rename = "author_name")]
    pub author: String,
    /// Publication date in `YYYY-MM-DD` form.
    #[serde(rename = "publication date")]
    pub publication_date: String,
}

/// Outcome of the conditional index fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryResult {
    /// The origin reported nothing new (or anything other than a fresh page).
    NoUpdates,
    /// Absolute article URLs in document order. Duplicates are kept.
    Articles(Vec<String>),
}

impl DiscoveryResult {
    /// The discovered URLs, empty for [`DiscoveryResult::NoUpdates`].
    pub fn urls(&self) -> &[String] {
        match self {
            DiscoveryResult::NoUpdates => &[],
            DiscoveryResult::Articles(urls) => urls,
        }
    }
}

/// An article that was discovered but did not make it into the results.
#[derive(Debug)]
pub struct ArticleFailure {
    pub url: String,
    pub error: CrawlError,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The index had nothing new since the threshold.
    NoUpdates,
    /// Every discovered article was attempted.
    Completed,
    /// Stopped part way through the article batch; records are partial.
    Cancelled,
}

/// Everything a single run produced.
///
/// `records` keeps discovery order. `failures` is the side channel for
/// articles that were skipped, each carrying the offending URL.
#[derive(Debug)]
pub struct RunReport {
    pub threshold: FreshnessThreshold,
    pub status: RunStatus,
    pub records: Vec<ArticleRecord>,
    pub failures: Vec<ArticleFailure>,
}

impl RunReport {
    pub fn no_updates(threshold: FreshnessThreshold) -> Self {
        Self {
            threshold,
            status: RunStatus::NoUpdates,
            records: Vec::new(),
            failures: Vec::new(),
        }
    }
}
