//! Fake transport for tests.
//!
//! Serves canned responses keyed by URL and records every request so tests
//! can assert on the conditional header and on request order.

use crate::error::{CrawlError, Result};
use crate::http::{HttpClient, HttpResponse};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::sync::Mutex;

enum Canned {
    Response(HttpResponse),
    TransportFailure(String),
}

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: HeaderMap,
}

#[derive(Default)]
pub struct FakeHttpClient {
    routes: HashMap<String, Canned>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `status` for `url`.
    pub fn with_response(mut self, url: &str, status: StatusCode, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Canned::Response(HttpResponse::new(status, body)),
        );
        self
    }

    /// Serve `body` with `200 OK` for `url`.
    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.with_response(url, StatusCode::OK, body)
    }

    /// Fail requests to `url` at the transport level.
    pub fn with_transport_failure(mut self, url: &str, reason: &str) -> Self {
        self.routes
            .insert(url.to_string(), Canned::TransportFailure(reason.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

impl HttpClient for FakeHttpClient {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers,
        });

        match self.routes.get(url) {
            Some(Canned::Response(response)) => Ok(response.clone()),
            Some(Canned::TransportFailure(reason)) => Err(CrawlError::fetch(url, reason)),
            None => Ok(HttpResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}

/// Index page with one `topic-title` anchor per href.
pub fn index_page(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a class="topic-title" href="{href}">Story {href}</a></li>"#))
        .collect();
    format!(
        r#"<html><body>
        <header><a href="/">NPR</a></header>
        <div class="topic-container"><ul>{items}</ul></div>
        <footer><a class="footer-link" href="/about">About</a></footer>
        </body></html>"#
    )
}

/// Article page with the usual `story-head` layout.
pub fn article_page(title: &str, byline: &str, dateline: &str) -> String {
    format!(
        r#"<html><body>
        <div class="story-head">
            <h1>{title}</h1>
            <p>{byline}</p>
            <p>{dateline}</p>
        </div>
        <div class="paragraphs-container"><p>Body text.</p></div>
        </body></html>"#
    )
}
