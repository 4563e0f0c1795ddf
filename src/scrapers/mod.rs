//! Scrapers for the text-only NPR site.
//!
//! Crawling follows a two-phase pattern:
//!
//! 1. **Indexing**: [`index::IndexFetcher`] asks for the index page only if
//!    it changed since a threshold and lists the article URLs on it
//! 2. **Fetching**: [`article::ArticleExtractor`] downloads each article and
//!    pulls out its headline, author and publication date
//!
//! | Module | Selects | Produces |
//! |--------|---------|----------|
//! | [`index`] | `div.topic-container a.topic-title[href]` | absolute URLs |
//! | [`article`] | `div.story-head` → `h1`, 1st `p`, 2nd `p` | [`crate::models::ArticleRecord`] |
//! | [`dates`] | first `"<word> <d>, <yyyy>"` run | `YYYY-MM-DD` |
//!
//! Both phases take the HTTP client as a borrowed [`crate::http::HttpClient`]
//! so tests can swap in a fake transport.

pub mod article;
pub mod dates;
pub mod index;
