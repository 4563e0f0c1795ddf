//! Crawl orchestration: threshold → conditional discovery → per-article
//! extraction.
//!
//! Article requests go through a [`Politeness`] throttle so the origin never
//! sees more than one request per configured delay from each worker. The
//! default is a single worker, i.e. strictly sequential fetching.
//!
//! A failed article is logged and recorded in [`RunReport::failures`]; it
//! never aborts the batch or cancels its siblings. Invalid input, an
//! unreachable index and an unrecognised index page abort the run.

use crate::clock::compute_threshold;
use crate::config::CrawlerConfig;
use crate::error::{CrawlError, Result};
use crate::http::HttpClient;
use crate::models::{ArticleFailure, ArticleRecord, DiscoveryResult, RunReport, RunStatus};
use crate::scrapers::article::ArticleExtractor;
use crate::scrapers::index::IndexFetcher;
use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Token-bucket throttle for article requests.
///
/// With `workers` concurrent fetchers and a delay `d`, one permit is
/// replenished every `d / workers` with a burst of `workers`, which gives
/// each worker one request per `d`. The bucket starts full, so the first
/// request of a run is never delayed. A zero delay disables throttling.
pub struct Politeness {
    limiter: Option<DirectRateLimiter>,
}

impl Politeness {
    pub fn new(delay: Duration, workers: usize) -> Self {
        let limiter = u32::try_from(workers.max(1))
            .ok()
            .and_then(NonZeroU32::new)
            .and_then(|burst| {
                Quota::with_period(delay / burst.get()).map(|quota| quota.allow_burst(burst))
            })
            .map(RateLimiter::direct);
        if limiter.is_none() && !delay.is_zero() {
            warn!(?delay, workers, "Delay too short to share between workers; not throttling");
        }
        Self { limiter }
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait until the next request may be sent.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

/// Sequences discovery and extraction for one run.
pub struct Pipeline<'a, C> {
    client: &'a C,
    fetcher: IndexFetcher<'a, C>,
    politeness: Politeness,
    concurrency: usize,
}

impl<'a, C: HttpClient> Pipeline<'a, C> {
    /// # Errors
    ///
    /// [`CrawlError::Config`] if the configured index URL is not absolute.
    pub fn new(client: &'a C, config: &CrawlerConfig) -> Result<Self> {
        let fetcher = IndexFetcher::new(client, &config.index_url)?;
        let concurrency = config.concurrency.max(1);
        let politeness = Politeness::new(config.politeness_delay(), concurrency);
        debug!(
            index_url = fetcher.index_url(),
            concurrency,
            throttled = politeness.is_enabled(),
            delay_ms = config.politeness_delay_ms,
            "Configured pipeline"
        );
        Ok(Self {
            client,
            fetcher,
            politeness,
            concurrency,
        })
    }

    /// Run against the current wall clock.
    pub async fn run(&self, minutes_ago: i64, cancel: &CancellationToken) -> Result<RunReport> {
        self.run_at(minutes_ago, Utc::now(), cancel).await
    }

    /// Run with an explicit `now`, which fixes the freshness threshold.
    ///
    /// Records come back in discovery order. If `cancel` fires during
    /// discovery the run fails with [`CrawlError::Cancelled`]; if it fires
    /// during the article batch no further articles are started and the
    /// report is returned with [`RunStatus::Cancelled`].
    #[instrument(level = "info", skip(self, now, cancel), fields(concurrency = self.concurrency))]
    pub async fn run_at<Tz: TimeZone>(
        &self,
        minutes_ago: i64,
        now: DateTime<Tz>,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let threshold = compute_threshold(minutes_ago, now)?;

        let discovery = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Cancelled during discovery");
                return Err(CrawlError::Cancelled);
            }
            result = self.fetcher.discover(&threshold) => result?,
        };

        let urls = match discovery {
            DiscoveryResult::NoUpdates => {
                info!(%threshold, "No new data have been retrieved");
                return Ok(RunReport::no_updates(threshold));
            }
            DiscoveryResult::Articles(urls) => urls,
        };

        let total = urls.len();
        let extractor = &ArticleExtractor::new(self.client);
        let politeness = &self.politeness;

        // Ordered buffering keeps discovery order regardless of which fetch
        // finishes first. `None` marks an article that was never started.
        let outcomes: Vec<(String, Option<Result<ArticleRecord>>)> = stream::iter(urls)
            .map(move |url| async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return (url, None),
                    _ = politeness.wait() => {}
                }
                let result = extractor.extract(&url).await;
                if let Err(e) = &result {
                    warn!(%url, error = %e, "Skipping article");
                }
                (url, Some(result))
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut records = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut not_started = 0usize;

        for (url, outcome) in outcomes {
            match outcome {
                None => not_started += 1,
                Some(Ok(record)) => records.push(record),
                Some(Err(error)) if error.is_per_article() => {
                    failures.push(ArticleFailure { url, error })
                }
                Some(Err(error)) => return Err(error),
            }
        }

        let status = if not_started > 0 {
            warn!(not_started, "Run cancelled before all articles were fetched");
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        info!(
            discovered = total,
            succeeded = records.len(),
            failed = failures.len(),
            not_started,
            "Finished article batch"
        );

        Ok(RunReport {
            threshold,
            status,
            records,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::testing::{FakeHttpClient, article_page, index_page};
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;
    use std::time::Instant;

    const ORIGIN: &str = "https://text.npr.org/";

    fn config(concurrency: usize) -> CrawlerConfig {
        CrawlerConfig {
            politeness_delay_ms: 0,
            concurrency,
            ..CrawlerConfig::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap()
    }

    fn article(n: usize) -> String {
        article_page(
            &format!("Headline {n}"),
            &format!("By Author {n}"),
            &format!("Published: January {n}, 2025"),
        )
    }

    /// Cancels the token once `trigger` has been fetched.
    struct CancellingClient {
        inner: FakeHttpClient,
        trigger: String,
        token: CancellationToken,
    }

    impl HttpClient for CancellingClient {
        async fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpResponse> {
            let response = self.inner.get(url, headers).await;
            if url == self.trigger {
                self.token.cancel();
            }
            response
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_run() {
        let client = FakeHttpClient::new()
            .with_page(ORIGIN, &index_page(&["/good", "/bad"]))
            .with_page("https://text.npr.org/good", &article(1))
            .with_transport_failure("https://text.npr.org/bad", "connection reset");
        let pipeline = Pipeline::new(&client, &config(1)).unwrap();

        let report = pipeline
            .run_at(30, now(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].title, "Headline 1");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].url, "https://text.npr.org/bad");
        assert!(matches!(report.failures[0].error, CrawlError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_no_updates_skips_article_fetches() {
        let client = FakeHttpClient::new().with_response(ORIGIN, StatusCode::NOT_MODIFIED, "");
        let pipeline = Pipeline::new(&client, &config(1)).unwrap();

        let report = pipeline
            .run_at(30, now(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::NoUpdates);
        assert!(report.records.is_empty());
        assert_eq!(client.requested_urls(), vec![ORIGIN.to_string()]);
    }

    #[tokio::test]
    async fn test_negative_minutes_aborts_before_any_request() {
        let client = FakeHttpClient::new();
        let pipeline = Pipeline::new(&client, &config(1)).unwrap();

        let err = pipeline
            .run_at(-1, now(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::InvalidArgument(_)));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognised_index_aborts() {
        let client = FakeHttpClient::new().with_page(ORIGIN, "<html><body></body></html>");
        let pipeline = Pipeline::new(&client, &config(1)).unwrap();

        let err = pipeline
            .run_at(30, now(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_index_fetch_failure_aborts() {
        let client = FakeHttpClient::new().with_transport_failure(ORIGIN, "dns failure");
        let pipeline = Pipeline::new(&client, &config(1)).unwrap();

        let err = pipeline
            .run_at(30, now(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_records_follow_discovery_order() {
        for concurrency in [1, 3] {
            let mut client = FakeHttpClient::new().with_page(
                ORIGIN,
                &index_page(&["/a1", "/a2", "/broken", "/a3", "/a4"]),
            );
            for n in 1..=4 {
                client = client.with_page(&format!("https://text.npr.org/a{n}"), &article(n));
            }
            client = client.with_page("https://text.npr.org/broken", "<html></html>");
            let pipeline = Pipeline::new(&client, &config(concurrency)).unwrap();

            let report = pipeline
                .run_at(30, now(), &CancellationToken::new())
                .await
                .unwrap();

            let titles: Vec<_> = report.records.iter().map(|r| r.title.as_str()).collect();
            assert_eq!(
                titles,
                vec!["Headline 1", "Headline 2", "Headline 3", "Headline 4"]
            );
            assert_eq!(report.failures.len(), 1);
            assert!(matches!(report.failures[0].error, CrawlError::Extract { .. }));
        }
    }

    #[tokio::test]
    async fn test_duplicate_urls_yield_duplicate_records() {
        let client = FakeHttpClient::new()
            .with_page(ORIGIN, &index_page(&["/same", "/same"]))
            .with_page("https://text.npr.org/same", &article(2));
        let pipeline = Pipeline::new(&client, &config(1)).unwrap();

        let report = pipeline
            .run_at(30, now(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0], report.records[1]);
    }

    #[tokio::test]
    async fn test_cancel_before_discovery() {
        let client = FakeHttpClient::new().with_page(ORIGIN, &index_page(&["/a1"]));
        let pipeline = Pipeline::new(&client, &config(1)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pipeline.run_at(30, now(), &cancel).await.unwrap_err();
        assert!(matches!(err, CrawlError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_mid_batch_keeps_partial_results() {
        let token = CancellationToken::new();
        let client = CancellingClient {
            inner: FakeHttpClient::new()
                .with_page(ORIGIN, &index_page(&["/a1", "/a2", "/a3"]))
                .with_page("https://text.npr.org/a1", &article(1))
                .with_page("https://text.npr.org/a2", &article(2))
                .with_page("https://text.npr.org/a3", &article(3)),
            trigger: "https://text.npr.org/a1".to_string(),
            token: token.clone(),
        };
        let pipeline = Pipeline::new(&client, &config(1)).unwrap();

        let report = pipeline.run_at(30, now(), &token).await.unwrap();

        assert_eq!(report.status, RunStatus::Cancelled);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].title, "Headline 1");
        assert!(report.failures.is_empty());
        assert_eq!(
            client.inner.requested_urls(),
            vec![ORIGIN.to_string(), "https://text.npr.org/a1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_politeness_spaces_article_requests() {
        let client = FakeHttpClient::new()
            .with_page(ORIGIN, &index_page(&["/a1", "/a2", "/a3"]))
            .with_page("https://text.npr.org/a1", &article(1))
            .with_page("https://text.npr.org/a2", &article(2))
            .with_page("https://text.npr.org/a3", &article(3));
        let config = CrawlerConfig {
            politeness_delay_ms: 40,
            concurrency: 1,
            ..CrawlerConfig::default()
        };
        let pipeline = Pipeline::new(&client, &config).unwrap();

        let started = Instant::now();
        let report = pipeline
            .run_at(30, now(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.records.len(), 3);
        // Two gaps between three article fetches.
        assert!(started.elapsed() >= Duration::from_millis(70));
    }

    #[tokio::test]
    async fn test_first_article_is_not_delayed() {
        let client = FakeHttpClient::new()
            .with_page(ORIGIN, &index_page(&["/a1"]))
            .with_page("https://text.npr.org/a1", &article(1));
        let config = CrawlerConfig {
            politeness_delay_ms: 500,
            concurrency: 1,
            ..CrawlerConfig::default()
        };
        let pipeline = Pipeline::new(&client, &config).unwrap();

        let started = Instant::now();
        let report = pipeline
            .run_at(30, now(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_politeness_delay_applies_per_worker() {
        let paths = ["/a1", "/a2", "/a3", "/a4", "/a5", "/a6"];
        let mut client = FakeHttpClient::new().with_page(ORIGIN, &index_page(&paths));
        for n in 1..=paths.len() {
            client = client.with_page(&format!("https://text.npr.org/a{n}"), &article(n));
        }
        let config = CrawlerConfig {
            politeness_delay_ms: 300,
            concurrency: 3,
            ..CrawlerConfig::default()
        };
        let pipeline = Pipeline::new(&client, &config).unwrap();

        let started = Instant::now();
        let report = pipeline
            .run_at(30, now(), &CancellationToken::new())
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.records.len(), 6);
        // Three workers at one request per 300ms each: roughly one delay in
        // total, well short of the five delays a single worker would need.
        assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(900), "{elapsed:?}");
    }

    #[test]
    fn test_zero_delay_disables_throttle() {
        assert!(!Politeness::new(Duration::ZERO, 1).is_enabled());
        assert!(Politeness::new(Duration::from_secs(1), 1).is_enabled());
        assert!(Politeness::new(Duration::from_secs(1), 4).is_enabled());
        // 1ns cannot be split between two workers.
        assert!(!Politeness::new(Duration::from_nanos(1), 2).is_enabled());
    }
}
