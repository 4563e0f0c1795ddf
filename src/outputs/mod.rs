//! Output sinks for extracted article records.
//!
//! Records are written as one file per run, named from a prefix and the
//! run's local timestamp:
//!
//! ```text
//! {prefix}articles_data_06_May_2025_14_30_00.csv
//! {prefix}articles_data_06_May_2025_14_30_00.json
//! ```
//!
//! # Submodules
//!
//! - [`csv`]: Header row `headline,author_name,publication date` plus one row per record
//! - [`json`]: A JSON array of objects keyed by the same column names
//!
//! Files are written to a `.partial` sibling first and renamed into place,
//! so a reader never sees a half-written file.

pub mod csv;
pub mod json;

use crate::error::Result;
use crate::models::ArticleRecord;
use crate::utils::file_timestamp;
use chrono::{DateTime, TimeZone};
use clap::ValueEnum;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Column names of the exported table, in order.
pub const COLUMNS: [&str; 3] = ["headline", "author_name", "publication date"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }

    fn render(self, records: &[ArticleRecord]) -> Result<Vec<u8>> {
        match self {
            OutputFormat::Csv => csv::render(records),
            OutputFormat::Json => json::render(records),
        }
    }
}

/// Build `{prefix}articles_data_{timestamp}.{ext}`.
pub fn output_path<Tz>(prefix: &str, format: OutputFormat, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    PathBuf::from(format!(
        "{prefix}articles_data_{}.{}",
        file_timestamp(at),
        format.extension()
    ))
}

/// Render `records` in `format` and write them under `prefix`.
///
/// # Returns
///
/// The path of the file that was written.
#[instrument(level = "info", skip(records, at), fields(count = records.len()))]
pub async fn write_records<Tz>(
    records: &[ArticleRecord],
    prefix: &str,
    format: OutputFormat,
    at: &DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let path = output_path(prefix, format, at);
    let bytes = format.render(records)?;
    write_atomically(&path, &bytes).await?;
    info!(path = %path.display(), "Your data have been saved");
    Ok(path)
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let written = async {
        fs::write(&partial, bytes).await?;
        fs::rename(&partial, path).await
    }
    .await;
    if let Err(e) = written {
        let _ = fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}
