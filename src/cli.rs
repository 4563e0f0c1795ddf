//! Command-line interface definitions for the NPR text crawler.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most tuning options can also be provided via environment variables or a
//! YAML config file; flags given here take precedence over the file.

use crate::config::ConfigOverrides;
use crate::outputs::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the crawler.
///
/// # Examples
///
/// ```sh
/// # Articles published in the last two hours, CSV in the current directory
/// npr_text_crawler -m 120
///
/// # JSON into ./data/ with a 2s politeness delay
/// npr_text_crawler -m 60 -o ./data/ --format json --delay-ms 2000
///
/// # Give up after 5 minutes, keeping whatever was collected
/// npr_text_crawler -m 1440 --deadline-secs 300
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Only fetch the index if it changed within this many minutes
    #[arg(short, long, allow_negative_numbers = true)]
    pub minutes_ago: i64,

    /// Prefix for the output file, e.g. `./data/` or `./data/npr_`
    #[arg(short, long, default_value = "")]
    pub output_prefix: String,

    /// Output file format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "CRAWLER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Index page URL; article links resolve against its site root
    #[arg(long, env = "CRAWLER_INDEX_URL")]
    pub index_url: Option<String>,

    /// Minimum delay between article requests, in milliseconds
    #[arg(long, env = "CRAWLER_DELAY_MS")]
    pub delay_ms: Option<u64>,

    /// Number of concurrent article fetches
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Stop starting new article fetches after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

impl Cli {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            index_url: self.index_url.clone(),
            politeness_delay_ms: self.delay_ms,
            concurrency: self.concurrency,
            request_timeout_secs: self.timeout_secs,
        }
    }
}
