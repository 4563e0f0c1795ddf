//! # NPR Text Crawler
//!
//! Conditionally refreshes the text-only NPR index, fetches each newly listed
//! article, extracts its headline, author and publication date, and writes
//! the results as a CSV (or JSON) table.
//!
//! ## Usage
//!
//! ```sh
//! npr_text_crawler -m 120 -o ./data/
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Threshold**: Turn "minutes ago" into an `If-Modified-Since` date
//! 2. **Indexing**: Fetch the index only if it changed, and list article URLs
//! 3. **Fetching**: Download each article (politely throttled) and extract fields
//! 4. **Output**: Write the gathered records to a timestamped file
//!
//! A single bad article is logged and skipped; an unreachable or redesigned
//! index aborts the run without writing a file.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod clock;
mod config;
mod error;
mod http;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
#[cfg(test)]
mod testing;
mod utils;

use cli::Cli;
use config::CrawlerConfig;
use http::ReqwestClient;
use models::RunStatus;
use pipeline::Pipeline;
use utils::{ensure_writable_dir, prefix_dir};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("npr_text_crawler starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = CrawlerConfig::load(args.config.as_deref(), args.config_overrides()).await?;
    info!(
        index_url = %config.index_url,
        delay_ms = config.politeness_delay_ms,
        concurrency = config.concurrency,
        "Loaded configuration"
    );

    // Early check: ensure the output directory is writable
    let output_dir = prefix_dir(&args.output_prefix);
    if let Err(e) = ensure_writable_dir(&output_dir).await {
        error!(
            path = %output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different prefix)"
        );
        return Err(e);
    }

    let client = ReqwestClient::new(config.request_timeout(), &config.user_agent)?;
    let pipeline = Pipeline::new(&client, &config)?;

    // ---- Cancellation: Ctrl-C or deadline ----
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(watch_for_stop(
        cancel.clone(),
        args.deadline_secs.map(Duration::from_secs),
    ));

    // ---- Crawl ----
    let result = pipeline.run(args.minutes_ago, &cancel).await;
    watcher.abort();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Run aborted; no output written");
            return Err(e.into());
        }
    };

    match report.status {
        RunStatus::NoUpdates => {
            info!(threshold = %report.threshold, "There have been no updates; 0 new articles")
        }
        RunStatus::Completed => info!(
            threshold = %report.threshold,
            articles = report.records.len(),
            failed = report.failures.len(),
            "Crawl completed"
        ),
        RunStatus::Cancelled => warn!(
            articles = report.records.len(),
            failed = report.failures.len(),
            "Crawl cancelled; writing the articles gathered so far"
        ),
    }
    for failure in &report.failures {
        debug!(url = %failure.url, error = %failure.error, "Skipped article");
    }

    // ---- Output ----
    let path = outputs::write_records(
        &report.records,
        &args.output_prefix,
        args.format,
        &Local::now(),
    )
    .await?;

    let elapsed = start_time.elapsed();
    info!(
        path = %path.display(),
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Cancel `token` on Ctrl-C or once `deadline` has elapsed.
async fn watch_for_stop(token: CancellationToken, deadline: Option<Duration>) {
    let deadline_elapsed = async {
        match deadline {
            Some(deadline) => tokio::time::sleep(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    let interrupted = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => warn!("Received Ctrl-C; no new articles will be fetched"),
            Err(e) => {
                error!(error = %e, "Could not listen for Ctrl-C; only the deadline applies");
                std::future::pending::<()>().await
            }
        }
    };

    tokio::select! {
        _ = interrupted => {}
        _ = deadline_elapsed => {
            warn!(?deadline, "Deadline reached; no new articles will be fetched");
        }
    }
    token.cancel();
}
