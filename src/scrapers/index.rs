//! Conditional discovery of article URLs from the text-only index page.
//!
//! The index is requested with `If-Modified-Since`; only a `200 OK` body is
//! parsed. Articles are the `a.topic-title` anchors inside the
//! `div.topic-container` list, and their site-relative hrefs are resolved
//! against the site root of the index URL.

use crate::clock::FreshnessThreshold;
use crate::error::{CrawlError, Result};
use crate::http::{HttpClient, IndexStatus, conditional_headers};
use crate::models::DiscoveryResult;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static TOPIC_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.topic-container").expect("valid selector"));
static TOPIC_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.topic-title").expect("valid selector"));

/// Issues the conditional index fetch.
pub struct IndexFetcher<'a, C> {
    client: &'a C,
    index_url: String,
    origin: String,
}

impl<'a, C: HttpClient> IndexFetcher<'a, C> {
    /// A trailing `/` is added to `index_url` if missing. Discovered hrefs
    /// resolve against the site root of `index_url`, not its path.
    ///
    /// # Errors
    ///
    /// [`CrawlError::Config`] if `index_url` is not an absolute URL.
    pub fn new(client: &'a C, index_url: &str) -> Result<Self> {
        let index_url = if index_url.ends_with('/') {
            index_url.to_string()
        } else {
            format!("{index_url}/")
        };
        let origin: String = Url::parse(&index_url)
            .and_then(|url| url.join("/"))
            .map_err(|e| CrawlError::Config(format!("invalid index_url {index_url:?}: {e}")))?
            .into();
        Ok(Self {
            client,
            index_url,
            origin,
        })
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Fetch the index if it changed since `threshold` and list its articles.
    ///
    /// # Errors
    ///
    /// - [`CrawlError::Fetch`] on transport failure
    /// - [`CrawlError::Parse`] if a fresh page lacks the topic container
    #[instrument(level = "info", skip_all, fields(url = %self.index_url, %threshold))]
    pub async fn discover(&self, threshold: &FreshnessThreshold) -> Result<DiscoveryResult> {
        let headers = conditional_headers(&threshold.header_value())?;
        let response = self.client.get(&self.index_url, headers).await?;

        match IndexStatus::classify(response.status) {
            IndexStatus::Fresh => {
                info!("Parsing new articles");
                let found = DiscoveryResult::Articles(parse_index(&response.body, &self.origin)?);
                info!(count = found.urls().len(), "Found articles to parse");
                debug!(urls = ?found.urls(), "Discovered URLs");
                Ok(found)
            }
            IndexStatus::NotModified => {
                info!("There have been no updates since the threshold");
                Ok(DiscoveryResult::NoUpdates)
            }
            IndexStatus::Unchanged(status) => {
                warn!(
                    %status,
                    body = %truncate_for_log(&response.body, 200),
                    "Index did not return fresh content; treating as no updates"
                );
                Ok(DiscoveryResult::NoUpdates)
            }
        }
    }
}

/// Extract absolute article URLs from an index page, in document order.
///
/// Anchors without an `href` are skipped. A single leading `/` is removed
/// from each href before it is appended to `origin`, the site root ending in `/`.
///
/// # Errors
///
/// [`CrawlError::Parse`] if the page has no `div.topic-container`.
pub fn parse_index(html: &str, origin: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);

    let container = document
        .select(&TOPIC_CONTAINER)
        .next()
        .ok_or_else(|| CrawlError::parse(origin, "no div.topic-container on index page"))?;

    let urls = container
        .select(&TOPIC_TITLE)
        .filter_map(|anchor| match anchor.value().attr("href") {
            Some(href) => Some(href),
            None => {
                debug!("Skipping topic-title anchor without href");
                None
            }
        })
        .map(|href| {
            let path = href.strip_prefix('/').unwrap_or(href);
            format!("{origin}{path}")
        })
        .collect();

    Ok(urls)
}
