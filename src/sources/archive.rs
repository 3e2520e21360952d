//! Substack archive endpoint parsing.
//!
//! `/api/v1/archive` returns a JSON array of post objects, newest first.

use crate::fetcher::FetchError;
use crate::models::{ArchivePost, RawEntry};

pub const PATH: &str = "api/v1/archive";

pub fn parse(body: &str) -> Result<Vec<RawEntry>, FetchError> {
    let posts: Vec<ArchivePost> =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(posts.into_iter().map(RawEntry::Archive).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_archive() {
        let body = r#"[
            {"title": "Hello", "canonical_url": "https://x.com/p", "post_date": "2024-01-05", "subtitle": "<p>Hi</p>", "audience": "everyone"},
            {"title": "Older", "canonical_url": "https://x.com/q", "post_date": "2023-12-01", "subtitle": null}
        ]"#;
        let entries = parse(body).unwrap();
        assert_eq!(entries.len(), 2);
        let RawEntry::Archive(first) = &entries[0] else {
            panic!("expected archive entry");
        };
        assert_eq!(first.title.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_parse_rejects_object() {
        assert!(matches!(parse(r#"{"error": "rate limited"}"#), Err(FetchError::Parse(_))));
    }
}
