//! Per-article field extraction.
//!
//! Article pages are fetched unconditionally. Everything we need lives in
//! the `div.story-head` block:
//!
//! ```html
//! <div class="story-head">
//!   <h1>Headline</h1>
//!   <p>By Jane Doe</p>
//!   <p>Published: March 3, 2024 at 5:00 AM ET</p>
//! </div>
//! ```

use super::dates::normalize_date;
use crate::error::{CrawlError, Result};
use crate::http::HttpClient;
use crate::models::ArticleRecord;
use once_cell::sync::Lazy;
use reqwest::header::HeaderMap;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

static STORY_HEAD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.story-head").expect("valid selector"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));

const BYLINE_PREFIX: &str = "By ";

/// Fetches single articles and pulls out title, author and date.
pub struct ArticleExtractor<'a, C> {
    client: &'a C,
}

impl<'a, C: HttpClient> ArticleExtractor<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Fetch `url` and extract its [`ArticleRecord`].
    ///
    /// # Errors
    ///
    /// - [`CrawlError::Fetch`] on transport failure or a non-2xx status
    /// - [`CrawlError::Extract`] if the header block, any field, or a
    ///   parseable date is missing
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn extract(&self, url: &str) -> Result<ArticleRecord> {
        let response = self.client.get(url, HeaderMap::new()).await?;

        if !response.status.is_success() {
            return Err(CrawlError::fetch(url, format!("HTTP {}", response.status)));
        }

        let record = parse_article(&response.body, url)?;
        debug!(title = %record.title, date = %record.publication_date, "Parsed article");
        Ok(record)
    }
}

/// Extract an [`ArticleRecord`] from an article page. `url` is only used in
/// error messages.
pub fn parse_article(html: &str, url: &str) -> Result<ArticleRecord> {
    let document = Html::parse_document(html);

    let header = document
        .select(&STORY_HEAD)
        .next()
        .ok_or_else(|| CrawlError::extract(url, "no div.story-head block"))?;

    let title = header
        .select(&HEADLINE)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CrawlError::extract(url, "missing or empty headline"))?;

    let mut paragraphs = header.select(&PARAGRAPH).map(element_text);

    let byline = paragraphs
        .next()
        .ok_or_else(|| CrawlError::extract(url, "missing byline paragraph"))?;
    let author = strip_byline(&byline);
    if author.is_empty() {
        return Err(CrawlError::extract(url, "empty byline"));
    }

    let dateline = paragraphs
        .next()
        .ok_or_else(|| CrawlError::extract(url, "missing dateline paragraph"))?;
    let publication_date = normalize_date(&dateline).map_err(|e| CrawlError::extract(url, e))?;

    Ok(ArticleRecord {
        title,
        author,
        publication_date,
    })
}

/// Remove a literal leading `"By "`; anything else is kept as-is.
fn strip_byline(byline: &str) -> String {
    byline
        .strip_prefix(BYLINE_PREFIX)
        .unwrap_or(byline)
        .trim()
        .to_string()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
