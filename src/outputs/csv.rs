//! CSV rendering.

use super::COLUMNS;
use crate::error::{CrawlError, Result};
use crate::models::ArticleRecord;
use csv::WriterBuilder;

/// Render the header row followed by one row per record.
///
/// The header is written explicitly so that an empty run still produces a
/// well-formed table.
pub fn render(records: &[ArticleRecord]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| CrawlError::Io(e.into_error()))
}
