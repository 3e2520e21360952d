//! Data models for source posts and their normalized representation.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceConfig`]: Static identity of one Substack publication
//! - [`RawEntry`]: A post as returned by the remote host, in either transport shape
//! - [`PostRecord`]: The normalized four-field post written into the template
//!
//! Field names of the wire types mirror the remote payloads (RSS element
//! names and the archive endpoint's snake_case JSON keys).

use serde::{Deserialize, Serialize};

/// Static identity of one content source.
///
/// The `slug` is the Substack subdomain used to build request URLs. The
/// `label` and `variable` are the names the target template uses for this
/// source: the marker comment reads `// {label} latest posts from ...` and
/// the array literal is declared as `const {variable}: BlogPost[]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Substack subdomain, e.g. `gentlevelocity`.
    pub slug: String,
    /// Display label used in the marker comment.
    pub label: String,
    /// Name of the array variable in the template.
    pub variable: String,
}

impl SourceConfig {
    pub fn new(slug: &str, label: &str, variable: &str) -> Self {
        Self {
            slug: slug.to_string(),
            label: label.to_string(),
            variable: variable.to_string(),
        }
    }

    /// Home page of the publication, used as the fallback post link.
    pub fn home_url(&self) -> String {
        format!("https://{}.substack.com", self.slug)
    }
}

/// One `<item>` of an RSS channel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub guid: Option<FeedGuid>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The `<guid>` element; Substack marks it `isPermaLink="false"` so only
/// the text content is kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedGuid {
    #[serde(default, rename = "$text")]
    pub value: Option<String>,
}

/// One post object of the `/api/v1/archive` listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchivePost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub post_date: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

/// A post as returned by the remote host, before normalization.
#[derive(Debug, Clone)]
pub enum RawEntry {
    Feed(FeedItem),
    Archive(ArchivePost),
}

/// A normalized post, ready to be written into the template.
///
/// Every field is always populated; see [`crate::normalize`] for the
/// fallbacks applied when the source omits something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub title: String,
    pub link: String,
    /// Calendar date rendered as `Month Day, Year`.
    pub date: String,
    /// Plain-text teaser, at most 120 characters.
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_url() {
        let source = SourceConfig::new("gentlevelocity", "Gentle Velocity", "gentleVelocityPosts");
        assert_eq!(source.home_url(), "https://gentlevelocity.substack.com");
    }

    #[test]
    fn test_archive_post_deserialization() {
        let json = r#"[{
            "id": 123,
            "title": "Hello",
            "canonical_url": "https://x.com/p",
            "post_date": "2024-01-05T10:00:00.000Z",
            "subtitle": null
        }]"#;

        let posts: Vec<ArchivePost> = serde_json::from_str(json).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title.as_deref(), Some("Hello"));
        assert_eq!(posts[0].canonical_url.as_deref(), Some("https://x.com/p"));
        assert!(posts[0].subtitle.is_none());
    }

    #[test]
    fn test_archive_post_missing_fields() {
        let posts: Vec<ArchivePost> = serde_json::from_str(r#"[{"id": 1}]"#).unwrap();
        assert!(posts[0].title.is_none());
        assert!(posts[0].post_date.is_none());
    }

    #[test]
    fn test_source_config_from_yaml() {
        let yaml = "slug: adityaaswani\nlabel: Aditya's\nvariable: adityaPosts\n";
        let source: SourceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(source, SourceConfig::new("adityaaswani", "Aditya's", "adityaPosts"));
    }
}
