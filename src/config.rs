//! Crawler configuration.
//!
//! Settings come from built-in defaults, optionally overlaid by a YAML file
//! (`--config`), and finally by command-line flags. Validation happens once
//! the layers are merged, before any network access.

use crate::error::{CrawlError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_INDEX_URL: &str = "https://text.npr.org/";
pub const DEFAULT_POLITENESS_DELAY_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tunables for a crawl run.
///
/// # Example
///
/// ```yaml
/// index_url: https://text.npr.org/
/// politeness_delay_ms: 1500
/// concurrency: 2
/// request_timeout_secs: 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Index page. Discovered article paths resolve against its site root.
    pub index_url: String,
    /// Minimum spacing between article requests per worker. `0` disables it.
    pub politeness_delay_ms: u64,
    /// Article fetch workers. `1` means strictly sequential.
    pub concurrency: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            politeness_delay_ms: DEFAULT_POLITENESS_DELAY_MS,
            concurrency: 1,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Values given on the command line; `None` leaves the lower layer alone.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub index_url: Option<String>,
    pub politeness_delay_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub request_timeout_secs: Option<u64>,
}

impl CrawlerConfig {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as a map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the YAML file at `path`, or the defaults if no path is given,
    /// then apply `overrides` and validate.
    #[instrument(level = "info", skip(overrides))]
    pub async fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = tokio::fs::read_to_string(path).await?;
                info!(path = %path.display(), "Loaded configuration file");
                Self::from_yaml(&text)?
            }
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(index_url) = overrides.index_url {
            self.index_url = index_url;
        }
        if let Some(delay) = overrides.politeness_delay_ms {
            self.politeness_delay_ms = delay;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout) = overrides.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
    }

    /// Check ranges and normalise `index_url` to end with `/`.
    pub fn validate(&mut self) -> Result<()> {
        let url = Url::parse(&self.index_url)
            .map_err(|e| CrawlError::Config(format!("invalid index_url {:?}: {e}", self.index_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CrawlError::Config(format!(
                "index_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if !self.index_url.ends_with('/') {
            self.index_url.push('/');
        }
        if self.concurrency == 0 {
            return Err(CrawlError::Config("concurrency must be at least 1".into()));
        }
        let workers = u32::try_from(self.concurrency)
            .map_err(|_| CrawlError::Config(format!("concurrency must be at most {}", u32::MAX)))?;
        // The delay is split into one permit per worker.
        if self.politeness_delay_ms > 0 && (self.politeness_delay() / workers).is_zero() {
            return Err(CrawlError::Config(format!(
                "politeness_delay_ms {} is too short for {} workers",
                self.politeness_delay_ms, self.concurrency
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CrawlError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(CrawlError::Config("user_agent must not be empty".into()));
        }
        Ok(())
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
