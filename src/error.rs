//! Typed errors for the crawl pipeline.
//!
//! The variants mirror how far a run gets before something goes wrong:
//! bad input, a transport failure, an index page we no longer recognise,
//! or an article page we cannot pull fields out of. Only [`CrawlError::Fetch`]
//! and [`CrawlError::Extract`] are survivable per article; everything else
//! ends the run.

use thiserror::Error;

/// Errors that can occur while crawling the index or an article.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// A caller-supplied argument is out of range (e.g. a negative duration).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport or HTTP-level failure.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The index page no longer has the structure we expect.
    #[error("unrecognised index page at {url}: {reason}")]
    Parse { url: String, reason: String },

    /// An article page is missing a field or its date is unparseable.
    #[error("could not extract article at {url}: {reason}")]
    Extract { url: String, reason: String },

    /// The run was stopped by an external signal or deadline.
    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CrawlError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn extract(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Extract {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this failure only concerns a single article, so the batch may
    /// continue without it.
    pub fn is_per_article(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Extract { .. })
    }
}

/// Result type alias for crawl operations.
pub type Result<T> = std::result::Result<T, CrawlError>;
