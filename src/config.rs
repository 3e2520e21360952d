//! Runtime settings for a refresh run.
//!
//! Every value has a compiled-in default reproducing the site's standard
//! setup (two Substack publications, RSS transport, sequential fetching).
//! An optional YAML file can override any subset of fields.

use crate::models::SourceConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

/// Which remote endpoint each source is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// `https://{slug}.substack.com/feed` (RSS 2.0 XML)
    Feed,
    /// `https://{slug}.substack.com/api/v1/archive` (JSON array)
    Archive,
}

impl Transport {
    /// Value of the `Accept` request header.
    pub fn accept(self) -> &'static str {
        match self {
            Transport::Feed => "application/rss+xml, application/xml, text/xml",
            Transport::Archive => "application/json, text/plain, */*",
        }
    }

    /// Origin phrase written into a source's marker comment.
    pub fn marker_origin(self) -> &'static str {
        match self {
            Transport::Feed => "RSS feed",
            Transport::Archive => "Substack API",
        }
    }

    /// Origin phrase written into the timestamp comment.
    pub fn stamp_origin(self) -> &'static str {
        match self {
            Transport::Feed => "RSS feeds",
            Transport::Archive => "Substack feeds",
        }
    }
}

/// Whether the sources are fetched one after another or at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordering {
    Sequential,
    Concurrent,
}

/// Retry parameters for one source fetch.
///
/// Converted into a [`crate::retry::RetryPolicy`] at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub backoff_step_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step_ms: 2000,
        }
    }
}

/// Everything a refresh run needs to know about its sources and transport.
///
/// Constructed once at startup (see [`Settings::load`]) and passed by
/// reference into the fetcher and the run orchestration; nothing mutates
/// it afterwards.
///
/// # YAML
///
/// Every field is optional in the settings file; missing fields keep the
/// value from [`Settings::default`].
///
/// ```yaml
/// transport: archive
/// retry:
///   max_attempts: 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Publications to fetch, in fetch order.
    pub sources: Vec<SourceConfig>,
    /// Endpoint used for every source.
    pub transport: Transport,
    /// One source after another, or all at once.
    pub ordering: Ordering,
    /// Pause between sources when fetching sequentially.
    pub inter_source_delay_ms: u64,
    /// Advisory per-request timeout.
    pub request_timeout_secs: u64,
    pub retry: RetrySettings,
    /// Pool of `User-Agent` strings rotated across attempts.
    pub user_agents: Vec<String>,
    /// Maximum number of posts kept per source.
    pub max_posts: usize,
    /// Bodies shorter than this are treated as a failed attempt.
    pub min_body_len: usize,
    /// Replaces `https://{slug}.substack.com` with `{base_url}/{slug}` when set.
    pub base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources: vec![
                SourceConfig::new("adityaaswani", "Aditya's", "adityaPosts"),
                SourceConfig::new("gentlevelocity", "Gentle Velocity", "gentleVelocityPosts"),
            ],
            transport: Transport::Feed,
            ordering: Ordering::Sequential,
            inter_source_delay_ms: 1000,
            request_timeout_secs: 15,
            retry: RetrySettings::default(),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            max_posts: 3,
            min_body_len: 50,
            base_url: None,
        }
    }
}

const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (compatible; Blog RSS Fetcher/1.0)",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

impl Settings {
    /// Load settings from an optional YAML file, falling back to defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a YAML settings file, or `None` for the defaults
    ///
    /// # Returns
    ///
    /// The validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result has no sources, an empty user-agent pool, or zero attempts.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let settings = match path {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path).await?;
                let settings = Self::from_yaml(&raw)?;
                info!(path, "Loaded settings file");
                settings
            }
            None => Self::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.sources.is_empty() {
            return Err("settings: at least one source is required".into());
        }
        if self.user_agents.is_empty() {
            return Err("settings: user_agents pool must not be empty".into());
        }
        if self.retry.max_attempts == 0 {
            return Err("settings: retry.max_attempts must be at least 1".into());
        }
        Ok(())
    }

    pub fn inter_source_delay(&self) -> Duration {
        Duration::from_millis(self.inter_source_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.sources.len(), 2);
        assert_eq!(settings.sources[0].slug, "adityaaswani");
        assert_eq!(settings.sources[1].variable, "gentleVelocityPosts");
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.backoff_step_ms, 2000);
        assert_eq!(settings.max_posts, 3);
        assert_eq!(settings.transport, Transport::Feed);
        assert_eq!(settings.ordering, Ordering::Sequential);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml("transport: archive\nretry:\n  max_attempts: 5\n").unwrap();
        assert_eq!(settings.transport, Transport::Archive);
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.backoff_step_ms, 2000);
        assert_eq!(settings.sources.len(), 2);
    }

    #[test]
    fn test_yaml_sources_override() {
        let yaml = r#"
sources:
  - slug: example
    label: Example
    variable: examplePosts
ordering: concurrent
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.sources.len(), 1);
        assert_eq!(settings.sources[0].home_url(), "https://example.substack.com");
        assert_eq!(settings.ordering, Ordering::Concurrent);
        assert_eq!(settings.base_url, None);
    }

    #[test]
    fn test_yaml_base_url() {
        let settings = Settings::from_yaml("base_url: http://127.0.0.1:8080\n").unwrap();
        assert_eq!(settings.base_url.as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn test_validate_rejects_empty_pool() {
        let settings = Settings {
            user_agents: vec![],
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_without_path_uses_defaults() {
        let settings = Settings::load(None).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_transport_phrases() {
        assert_eq!(Transport::Feed.marker_origin(), "RSS feed");
        assert_eq!(Transport::Archive.stamp_origin(), "Substack feeds");
        assert!(Transport::Feed.accept().contains("application/rss+xml"));
    }
}
