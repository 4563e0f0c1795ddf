//! JSON rendering.
//!
//! The JSON output is an array of objects keyed by the same column names as
//! the CSV header, in run order:
//!
//! ```json
//! [
//!   {
//!     "headline": "Storm hits coast",
//!     "author_name": "Jane Doe",
//!     "publication date": "2024-03-03"
//!   }
//! ]
//! ```

use crate::error::Result;
use crate::models::ArticleRecord;

pub fn render(records: &[ArticleRecord]) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(records)?;
    bytes.push(b'\n');
    Ok(bytes)
}
