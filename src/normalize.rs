//! Mapping of raw source entries onto [`PostRecord`].
//!
//! Normalization never fails: every missing or malformed field is replaced
//! by a fixed fallback so the rendered template always has four populated
//! strings per post.

use crate::models::{ArchivePost, FeedItem, PostRecord, RawEntry, SourceConfig};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

pub const UNTITLED: &str = "Untitled Post";
pub const READ_MORE: &str = "Click to read more...";
pub const INVALID_DATE: &str = "Invalid Date";
pub const DESCRIPTION_MAX_CHARS: usize = 120;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Normalize the first `max` entries, keeping source order.
pub fn normalize_entries(entries: &[RawEntry], source: &SourceConfig, max: usize) -> Vec<PostRecord> {
    entries
        .iter()
        .take(max)
        .map(|entry| normalize_entry(entry, source))
        .collect()
}

pub fn normalize_entry(entry: &RawEntry, source: &SourceConfig) -> PostRecord {
    match entry {
        RawEntry::Feed(item) => normalize_feed_item(item, source),
        RawEntry::Archive(post) => normalize_archive_post(post, source),
    }
}

fn normalize_feed_item(item: &FeedItem, source: &SourceConfig) -> PostRecord {
    let guid = item.guid.as_ref().and_then(|g| g.value.as_deref());
    PostRecord {
        title: title_or_default(item.title.as_deref()),
        link: link_or_default(&[item.link.as_deref(), guid], source),
        date: format_date(item.pub_date.as_deref()),
        description: teaser(item.description.as_deref()),
    }
}

fn normalize_archive_post(post: &ArchivePost, source: &SourceConfig) -> PostRecord {
    PostRecord {
        title: title_or_default(post.title.as_deref()),
        link: link_or_default(&[post.canonical_url.as_deref()], source),
        date: format_date(post.post_date.as_deref()),
        description: teaser(post.subtitle.as_deref()),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn title_or_default(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => UNTITLED.to_string(),
    }
}

fn link_or_default(candidates: &[Option<&str>], source: &SourceConfig) -> String {
    candidates
        .iter()
        .find_map(|c| non_empty(*c))
        .map(str::to_string)
        .unwrap_or_else(|| source.home_url())
}

/// Render a source timestamp as `Month Day, Year`.
///
/// Accepts RFC 2822 (RSS `pubDate`), RFC 3339 and bare `YYYY-MM-DD`. The
/// calendar day is taken in the timestamp's own offset. Anything else
/// renders as [`INVALID_DATE`].
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = non_empty(raw) else {
        return INVALID_DATE.to_string();
    };

    let date = DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => {
            tracing::debug!(raw, "Unparseable post date");
            INVALID_DATE.to_string()
        }
    }
}

/// Strip markup, keep the first [`DESCRIPTION_MAX_CHARS`] characters, trim.
///
/// Truncation counts characters, not words, so it may cut mid-word.
pub fn teaser(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return READ_MORE.to_string();
    };
    let stripped = TAG_RE.replace_all(raw, "");
    let cut: String = stripped.chars().take(DESCRIPTION_MAX_CHARS).collect();
    let trimmed = cut.trim();
    if trimmed.is_empty() {
        READ_MORE.to_string()
    } else {
        trimmed.to_string()
    }
}
