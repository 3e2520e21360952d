//! HTTP retrieval of recent posts for one source.
//!
//! # Architecture
//!
//! - [`FetchPosts`]: Core trait for a single fetch attempt
//! - [`HttpFetcher`]: `reqwest` implementation hitting the Substack endpoints
//! - [`crate::retry::RetryFetch`]: Decorator that applies the retry policy
//!
//! A single attempt either yields at least one raw entry or a [`FetchError`].
//! Deciding whether to try again is left to the retry layer.

use crate::config::{Settings, Transport};
use crate::models::{RawEntry, SourceConfig};
use crate::sources;
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::StatusCode;
use reqwest::header::{
    ACCEPT, CACHE_CONTROL, CONNECTION, DNT, PRAGMA, REFERER, USER_AGENT,
};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Why a single fetch attempt failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error("response body too short ({len} bytes, expected at least {min})")]
    BodyTooShort { len: usize, min: usize },
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("no posts found in response")]
    NoItems,
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    /// Transient failures are worth another attempt; a malformed endpoint
    /// will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::InvalidUrl(_))
    }
}

/// One attempt at retrieving the recent posts of a source.
///
/// `attempt` is the zero-based attempt index, which implementations may use
/// to vary request identity between retries.
pub trait FetchPosts {
    async fn fetch(&self, source: &SourceConfig, attempt: usize) -> Result<Vec<RawEntry>, FetchError>;
}

/// Fetches posts over HTTP from the configured [`Transport`].
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    transport: Transport,
    user_agents: Vec<String>,
    /// Starting index into `user_agents`, chosen once per run.
    ua_offset: usize,
    min_body_len: usize,
    max_posts: usize,
    base_url: Option<String>,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        let ua_offset = rng().random_range(0..settings.user_agents.len().max(1));

        Ok(Self {
            client,
            transport: settings.transport,
            user_agents: settings.user_agents.clone(),
            ua_offset,
            min_body_len: settings.min_body_len,
            max_posts: settings.max_posts,
            base_url: settings.base_url.clone(),
        })
    }

    /// User agent for the given attempt, rotating through the pool.
    fn user_agent(&self, attempt: usize) -> &str {
        if self.user_agents.is_empty() {
            return "";
        }
        &self.user_agents[(self.ua_offset + attempt) % self.user_agents.len()]
    }
}

impl FetchPosts for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(source = %source.slug, attempt = attempt))]
    async fn fetch(&self, source: &SourceConfig, attempt: usize) -> Result<Vec<RawEntry>, FetchError> {
        let url = sources::endpoint(self.transport, source, self.base_url.as_deref())?;
        let user_agent = self.user_agent(attempt);
        debug!(%url, user_agent, "Requesting posts");

        let t0 = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, self.transport.accept())
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .header(REFERER, format!("{}/", source.home_url()))
            .header(DNT, "1")
            .header(CONNECTION, "keep-alive")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let dt = t0.elapsed();
        debug!(bytes = body.len(), elapsed_ms = dt.as_millis(), "Received response");

        if body.trim().len() < self.min_body_len {
            warn!(body = %truncate_for_log(&body, 200), "Response body implausibly short");
            return Err(FetchError::BodyTooShort {
                len: body.trim().len(),
                min: self.min_body_len,
            });
        }

        let mut entries = sources::parse(self.transport, &body).inspect_err(|e| {
            debug!(error = %e, body = %truncate_for_log(&body, 300), "Unparseable response");
        })?;
        if entries.is_empty() {
            return Err(FetchError::NoItems);
        }

        entries.truncate(self.max_posts);
        info!(%url, count = entries.len(), "Fetched posts");
        Ok(entries)
    }
}
