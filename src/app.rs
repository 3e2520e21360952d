//! One refresh run: fetch every source, normalize, patch the template.
//!
//! The template is only touched once every source produced posts. A source
//! that exhausted its retries turns the run into [`RunStatus::Skipped`],
//! which is reported as a failure but is not an error.

use crate::config::{Ordering, Settings};
use crate::fetcher::FetchPosts;
use crate::models::{PostRecord, RawEntry, SourceConfig};
use crate::normalize::normalize_entries;
use crate::retry::RetryFetch;
use crate::template::{self, PatchReport, PostBlock};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::error::Error;
use std::path::Path;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub enum RunStatus {
    /// The template was rewritten (or rendered, for a dry run).
    Updated(PatchReport),
    /// At least one source failed; the template was left untouched.
    Skipped { failed: Vec<String> },
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Updated(_))
    }
}

/// Fetch every configured source according to `settings.ordering`.
#[instrument(level = "info", skip_all, fields(ordering = ?settings.ordering))]
pub async fn fetch_all<F: FetchPosts>(
    fetcher: &RetryFetch<F>,
    settings: &Settings,
) -> Vec<Option<Vec<RawEntry>>> {
    match settings.ordering {
        Ordering::Sequential => {
            let mut results = Vec::with_capacity(settings.sources.len());
            for (i, source) in settings.sources.iter().enumerate() {
                if i > 0 {
                    sleep(settings.inter_source_delay()).await;
                }
                results.push(fetcher.fetch(source).await);
            }
            results
        }
        Ordering::Concurrent => join_all(settings.sources.iter().map(|s| fetcher.fetch(s))).await,
    }
}

#[instrument(level = "info", skip_all, fields(target = %target.display(), dry_run = dry_run))]
pub async fn refresh<F: FetchPosts>(
    fetcher: &RetryFetch<F>,
    settings: &Settings,
    target: &Path,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<RunStatus, Box<dyn Error>> {
    info!(sources = settings.sources.len(), transport = ?settings.transport, "Fetching feeds");
    let fetched = fetch_all(fetcher, settings).await;

    let failed: Vec<String> = settings
        .sources
        .iter()
        .zip(&fetched)
        .filter(|(_, result)| result.is_none())
        .map(|(source, _)| source.slug.clone())
        .collect();
    if !failed.is_empty() {
        warn!(?failed, "Failed to fetch one or more feeds, skipping update");
        return Ok(RunStatus::Skipped { failed });
    }

    let normalized: Vec<(&SourceConfig, Vec<PostRecord>)> = settings
        .sources
        .iter()
        .zip(fetched.iter().flatten())
        .map(|(source, entries)| (source, normalize_entries(entries, source, settings.max_posts)))
        .collect();
    for (source, posts) in &normalized {
        info!(source = %source.slug, posts = posts.len(), "Normalized posts");
    }

    let blocks: Vec<PostBlock<'_>> = normalized
        .iter()
        .map(|(source, posts)| PostBlock {
            source: *source,
            posts: posts.as_slice(),
        })
        .collect();
    let report = template::patch_file(target, &blocks, settings.transport, now, dry_run).await?;

    Ok(RunStatus::Updated(report))
}
