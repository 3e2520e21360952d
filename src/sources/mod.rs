//! Per-transport endpoint construction and response parsing.
//!
//! Every Substack publication exposes the same two read endpoints; this
//! module dispatches on [`Transport`] to the matching submodule.
//!
//! # Supported Transports
//!
//! | Transport | Module | Endpoint | Body |
//! |-----------|--------|----------|------|
//! | Feed | [`feed`] | `https://{slug}.substack.com/feed` | RSS 2.0 XML |
//! | Archive | [`archive`] | `https://{slug}.substack.com/api/v1/archive` | JSON array |
//!
//! Both parsers return every entry found; capping to the configured number
//! of posts happens in the fetcher.

use crate::config::Transport;
use crate::fetcher::FetchError;
use crate::models::{RawEntry, SourceConfig};
use url::Url;

pub mod archive;
pub mod feed;

/// Request URL for one source.
///
/// # Arguments
///
/// * `transport` - Which endpoint to request
/// * `source` - The publication being fetched
/// * `base_url` - Optional override of the Substack host; the source is then
///   addressed as `{base_url}/{slug}/...` (mirrors and local test servers)
///
/// # Returns
///
/// The absolute endpoint URL, or a parse error for a malformed slug or base.
pub fn endpoint(
    transport: Transport,
    source: &SourceConfig,
    base_url: Option<&str>,
) -> Result<Url, url::ParseError> {
    let base = match base_url {
        Some(base) => Url::parse(&format!("{}/{}/", base.trim_end_matches('/'), source.slug))?,
        None => Url::parse(&format!("{}/", source.home_url()))?,
    };
    match transport {
        Transport::Feed => base.join(feed::PATH),
        Transport::Archive => base.join(archive::PATH),
    }
}

/// Parse a response body into raw entries, in the order the host returned them.
pub fn parse(transport: Transport, body: &str) -> Result<Vec<RawEntry>, FetchError> {
    match transport {
        Transport::Feed => feed::parse(body),
        Transport::Archive => archive::parse(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let source = SourceConfig::new("adityaaswani", "Aditya's", "adityaPosts");
        assert_eq!(
            endpoint(Transport::Feed, &source, None).unwrap().as_str(),
            "https://adityaaswani.substack.com/feed"
        );
        assert_eq!(
            endpoint(Transport::Archive, &source, None).unwrap().as_str(),
            "https://adityaaswani.substack.com/api/v1/archive"
        );
    }

    #[test]
    fn test_endpoint_rejects_bad_slug() {
        let source = SourceConfig::new("bad slug/with spaces", "Bad", "badPosts");
        assert!(endpoint(Transport::Feed, &source, None).is_err());
    }

    #[test]
    fn test_endpoint_with_base_override() {
        let source = SourceConfig::new("gentlevelocity", "Gentle Velocity", "gentleVelocityPosts");
        assert_eq!(
            endpoint(Transport::Feed, &source, Some("http://127.0.0.1:8080/")).unwrap().as_str(),
            "http://127.0.0.1:8080/gentlevelocity/feed"
        );
        assert_eq!(
            endpoint(Transport::Archive, &source, Some("http://mirror.local/substack"))
                .unwrap()
                .as_str(),
            "http://mirror.local/substack/gentlevelocity/api/v1/archive"
        );
    }
}
