//! HTTP collaborator used by the index fetcher and the article extractor.
//!
//! The crawl core only needs a status code and a body, so it talks to the
//! network through the small [`HttpClient`] trait. [`ReqwestClient`] is the
//! production implementation; tests substitute a fake transport.

use crate::error::{CrawlError, Result};
use reqwest::header::{HeaderMap, HeaderValue, IF_MODIFIED_SINCE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Trait for issuing GET requests.
///
/// Implementors return `Ok` for any HTTP status; only transport failures
/// (DNS, connect, timeout, body read) are errors, reported as
/// [`CrawlError::Fetch`].
pub trait HttpClient {
    /// GET `url` with the given extra request headers.
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpResponse>;
}

/// How the index response should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// `200 OK`: there is new content to parse.
    Fresh,
    /// `304 Not Modified`.
    NotModified,
    /// Any other status. Treated as "nothing new", not as an error.
    Unchanged(StatusCode),
}

impl IndexStatus {
    pub fn classify(status: StatusCode) -> Self {
        match status {
            StatusCode::OK => IndexStatus::Fresh,
            StatusCode::NOT_MODIFIED => IndexStatus::NotModified,
            other => IndexStatus::Unchanged(other),
        }
    }
}

/// Build the header map for a conditional GET.
pub fn conditional_headers(if_modified_since: &str) -> Result<HeaderMap> {
    let value = HeaderValue::from_str(if_modified_since).map_err(|e| {
        CrawlError::InvalidArgument(format!("bad If-Modified-Since value {if_modified_since:?}: {e}"))
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(IF_MODIFIED_SINCE, value);
    Ok(headers)
}

/// [`HttpClient`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Build a client with a request timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| CrawlError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| CrawlError::fetch(url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CrawlError::fetch(url, e))?;

        debug!(%status, bytes = body.len(), "Received response");
        Ok(HttpResponse::new(status, body))
    }
}
